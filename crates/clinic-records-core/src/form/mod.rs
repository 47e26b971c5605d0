//! Patient form validation.
//!
//! Submission is gated on the flattened draft: every registry field marked
//! required must have a non-empty flattened value. A date of birth edited in
//! the form flattens to `"-"`, so it never blocks submission on its own.

mod state;

pub use state::*;

use crate::flatten::flatten;
use crate::models::{keys, FlatStringPatient, Patient};
use crate::registry::KeyedDataFields;

/// Flattened keys that never take part in required-field checks.
pub const EXEMPT_KEYS: [&str; 3] = [keys::ID, keys::TIMESTAMP, keys::IS_SEED];

/// Whether `draft` may be submitted under `registry`.
pub fn is_submittable(draft: &Patient, registry: &KeyedDataFields) -> bool {
    let flat = flatten(draft);
    if flat.is_empty() {
        return false;
    }
    first_empty_required(&flat, registry).is_none()
}

/// First required field (by field name) whose flattened value is empty.
pub fn first_missing_required(draft: &Patient, registry: &KeyedDataFields) -> Option<String> {
    first_empty_required(&flatten(draft), registry).map(str::to_string)
}

fn first_empty_required<'a>(flat: &'a FlatStringPatient, registry: &KeyedDataFields) -> Option<&'a str> {
    flat.iter()
        .filter(|(key, _)| !EXEMPT_KEYS.contains(key))
        .find(|(key, value)| {
            value.is_empty()
                && registry
                    .get(*key)
                    .is_some_and(|field| field.is_required_on_patient_form)
        })
        .map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_fields, Address, DataField, DateOfBirth, InputType};
    use crate::registry::keyed_by_field_name;
    use chrono::NaiveDate;

    fn complete_draft() -> Patient {
        let mut patient = Patient::new("Ada", "Lovelace");
        patient.middle_name = "King".into();
        patient.sex = "female".into();
        patient.gender = "woman".into();
        patient.phone = "555-0100".into();
        patient.addresses = vec![
            Address::new("1 Main", "Ames", "IA", "50010", true),
            Address::empty(false),
        ];
        patient
    }

    #[test]
    fn test_required_phone_gates_submission() {
        let registry = keyed_by_field_name(&default_fields());
        let mut draft = complete_draft();
        draft.phone = String::new();
        assert!(!is_submittable(&draft, &registry));
        assert_eq!(first_missing_required(&draft, &registry), Some("phone".into()));

        draft.phone = "555-0100".into();
        assert!(is_submittable(&draft, &registry));
    }

    #[test]
    fn test_optional_fields_do_not_gate() {
        let registry = keyed_by_field_name(&default_fields());
        let mut draft = complete_draft();
        draft.notes = String::new();
        assert!(is_submittable(&draft, &registry));
    }

    #[test]
    fn test_empty_form_not_submittable() {
        let registry = keyed_by_field_name(&default_fields());
        assert!(!is_submittable(&Patient::empty(), &registry));
    }

    #[test]
    fn test_blank_primary_address_gates() {
        let registry = keyed_by_field_name(&default_fields());
        let mut draft = complete_draft();
        draft.addresses[0] = Address::empty(true);
        assert!(!is_submittable(&draft, &registry));
    }

    #[test]
    fn test_edited_dob_never_gates() {
        let registry = keyed_by_field_name(&default_fields());
        let mut draft = complete_draft();
        draft.dob = Some(DateOfBirth::Date(NaiveDate::from_ymd_opt(1815, 12, 10).unwrap()));
        assert!(is_submittable(&draft, &registry));
        draft.dob = None;
        assert!(is_submittable(&draft, &registry));
    }

    #[test]
    fn test_required_custom_field() {
        let mut fields = default_fields();
        let mut weight = DataField::custom("weight", "Weight", InputType::Number);
        weight.is_required_on_patient_form = true;
        fields.push(weight);
        let registry = keyed_by_field_name(&fields);

        let mut draft = complete_draft();
        draft.custom.insert("weight".into(), "".into());
        assert!(!is_submittable(&draft, &registry));

        draft.custom.insert("weight".into(), 61.0.into());
        assert!(is_submittable(&draft, &registry));
    }

    #[test]
    fn test_unregistered_keys_ignored() {
        let registry = keyed_by_field_name(&[]);
        assert!(is_submittable(&Patient::empty(), &registry));
    }
}
