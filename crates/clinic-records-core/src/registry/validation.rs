//! Field-name checks and custom value validation against the registry.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{CustomValue, DataField, InputType, Patient};

/// Longest display name accepted for a new field, in characters.
pub const MAX_FIELD_NAME_LEN: usize = 20;

/// Custom value errors.
#[derive(Error, Debug, PartialEq)]
pub enum FieldValueError {
    #[error("Field is not declared in the registry: {0}")]
    Undeclared(String),

    #[error("Field is built in and has no custom value: {0}")]
    NotCustom(String),

    #[error("Invalid number for {field}: {value:?}")]
    InvalidNumber { field: String, value: String },

    #[error("Invalid date for {field}: {value:?}")]
    InvalidDate { field: String, value: String },

    #[error("Value of {field} is not a {expected} value")]
    KindMismatch { field: String, expected: InputType },
}

pub type FieldValueResult<T> = Result<T, FieldValueError>;

/// Field name derived from a display name: lowercase, spaces to underscores.
pub fn derive_field_name(display_name: &str) -> String {
    display_name.to_lowercase().replace(' ', "_")
}

/// Whether `input` may become a new field.
///
/// Rejects blank input, input longer than [`MAX_FIELD_NAME_LEN`], and input
/// whose derived field name or raw display name is already taken.
pub fn is_valid_new_field(input: &str, existing: &[DataField]) -> bool {
    if input.trim().is_empty() {
        return false;
    }
    if input.chars().count() > MAX_FIELD_NAME_LEN {
        return false;
    }
    let field_name = derive_field_name(input);
    !existing
        .iter()
        .any(|f| f.field_name == field_name || f.display_name == input)
}

/// Turn raw form input for a custom field into its typed value.
pub fn coerce_custom_input(field: &DataField, raw: &str) -> FieldValueResult<CustomValue> {
    if !field.is_non_default_field {
        return Err(FieldValueError::NotCustom(field.field_name.clone()));
    }
    if raw.is_empty() {
        return Ok(CustomValue::Text(String::new()));
    }
    match field.type_label() {
        InputType::Text => Ok(CustomValue::Text(raw.to_string())),
        InputType::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(CustomValue::Number)
            .ok_or_else(|| FieldValueError::InvalidNumber {
                field: field.field_name.clone(),
                value: raw.to_string(),
            }),
        InputType::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(|_| CustomValue::Text(raw.trim().to_string()))
            .map_err(|_| FieldValueError::InvalidDate {
                field: field.field_name.clone(),
                value: raw.to_string(),
            }),
    }
}

/// Check every custom value on `patient` against the registry.
///
/// Numbers must be finite. Text fields hold any value kind; number fields
/// hold numbers or text that parses as one; date fields hold `YYYY-MM-DD`
/// text only.
pub fn validate_custom_fields(patient: &Patient, fields: &[DataField]) -> FieldValueResult<()> {
    for (name, value) in &patient.custom {
        let field = fields
            .iter()
            .find(|f| &f.field_name == name)
            .ok_or_else(|| FieldValueError::Undeclared(name.clone()))?;
        if !field.is_non_default_field {
            return Err(FieldValueError::NotCustom(name.clone()));
        }
        check_value_kind(field, value)?;
    }
    Ok(())
}

fn check_value_kind(field: &DataField, value: &CustomValue) -> FieldValueResult<()> {
    let expected = field.type_label();
    match (value, expected) {
        (CustomValue::Text(text), _) => coerce_custom_input(field, text).map(|_| ()),
        (CustomValue::Number(n), _) if !n.is_finite() => Err(FieldValueError::InvalidNumber {
            field: field.field_name.clone(),
            value: n.to_string(),
        }),
        (CustomValue::Number(_), InputType::Text | InputType::Number) => Ok(()),
        (CustomValue::Bool(_), InputType::Text) => Ok(()),
        _ => Err(FieldValueError::KindMismatch {
            field: field.field_name.clone(),
            expected,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_fields;

    #[test]
    fn test_valid_new_field() {
        let existing = default_fields();
        assert!(is_valid_new_field("Allergies", &existing));
        assert!(is_valid_new_field("Blood Type", &existing));
    }

    #[test]
    fn test_invalid_new_field() {
        let existing = default_fields();
        assert!(!is_valid_new_field("", &existing));
        assert!(!is_valid_new_field("   ", &existing));
        assert!(!is_valid_new_field("abcdefghijklmnopqrstuvwxy", &existing));
        assert!(!is_valid_new_field("Phone Number", &existing));
        // derived field name collides
        assert!(!is_valid_new_field("First Name", &existing));
        assert!(!is_valid_new_field("PHONE", &existing));
    }

    #[test]
    fn test_length_boundary() {
        let existing = default_fields();
        assert!(is_valid_new_field("abcdefghijklmnopqrst", &existing));
        assert!(!is_valid_new_field("abcdefghijklmnopqrstu", &existing));
    }

    #[test]
    fn test_display_name_compare_is_case_sensitive() {
        let existing = vec![DataField::custom("allergy_list", "Allergies", InputType::Text)];
        assert!(!is_valid_new_field("Allergies", &existing));
        // different derived name and display name differs in case only
        let existing = vec![DataField::custom("x", "Allergies", InputType::Text)];
        assert!(is_valid_new_field("ALLERGIES", &existing));
    }

    #[test]
    fn test_derive_field_name() {
        assert_eq!(derive_field_name("Blood Type"), "blood_type");
        assert_eq!(derive_field_name("Emergency  Contact"), "emergency__contact");
    }

    #[test]
    fn test_coerce_number() {
        let weight = DataField::custom("weight", "Weight", InputType::Number);
        assert_eq!(coerce_custom_input(&weight, "72.5"), Ok(CustomValue::Number(72.5)));
        assert_eq!(coerce_custom_input(&weight, ""), Ok(CustomValue::Text(String::new())));
        assert!(matches!(
            coerce_custom_input(&weight, "heavy"),
            Err(FieldValueError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_coerce_rejects_non_finite_numbers() {
        let weight = DataField::custom("weight", "Weight", InputType::Number);
        for raw in ["NaN", "nan", "inf", "-inf", "infinity", " Infinity "] {
            assert!(
                matches!(
                    coerce_custom_input(&weight, raw),
                    Err(FieldValueError::InvalidNumber { .. })
                ),
                "accepted {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_coerce_rejects_builtin() {
        let phone = DataField::builtin("phone", "Phone", -1, true);
        assert_eq!(
            coerce_custom_input(&phone, "555"),
            Err(FieldValueError::NotCustom("phone".into()))
        );
    }

    #[test]
    fn test_validate_custom_fields() {
        let mut fields = default_fields();
        fields.push(DataField::custom("weight", "Weight", InputType::Number));

        let mut patient = Patient::new("Ada", "Lovelace");
        patient.custom.insert("weight".into(), CustomValue::Number(61.0));
        assert!(validate_custom_fields(&patient, &fields).is_ok());

        patient.custom.insert("weight".into(), "sixty".into());
        assert!(validate_custom_fields(&patient, &fields).is_err());

        patient.custom.clear();
        patient.custom.insert("shoe_size".into(), "9".into());
        assert_eq!(
            validate_custom_fields(&patient, &fields),
            Err(FieldValueError::Undeclared("shoe_size".into()))
        );
    }

    #[test]
    fn test_validate_checks_typed_values() {
        let mut fields = default_fields();
        fields.push(DataField::custom("weight", "Weight", InputType::Number));
        fields.push(DataField::custom("seen_on", "Seen On", InputType::Date));
        fields.push(DataField::custom("smoker", "Smoker", InputType::Text));

        let mut patient = Patient::new("Ada", "Lovelace");
        patient.custom.insert("smoker".into(), CustomValue::Bool(true));
        patient.custom.insert("seen_on".into(), "2024-01-02".into());
        assert!(validate_custom_fields(&patient, &fields).is_ok());

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            patient.custom.insert("weight".into(), CustomValue::Number(bad));
            assert!(matches!(
                validate_custom_fields(&patient, &fields),
                Err(FieldValueError::InvalidNumber { .. })
            ));
        }
        patient.custom.insert("weight".into(), CustomValue::Bool(true));
        assert_eq!(
            validate_custom_fields(&patient, &fields),
            Err(FieldValueError::KindMismatch {
                field: "weight".into(),
                expected: InputType::Number,
            })
        );

        patient.custom.insert("weight".into(), CustomValue::Number(61.0));
        patient.custom.insert("seen_on".into(), CustomValue::Number(20240102.0));
        assert!(matches!(
            validate_custom_fields(&patient, &fields),
            Err(FieldValueError::KindMismatch { expected: InputType::Date, .. })
        ));
    }
}
