//! Patient flattening for tables, search and form validation.
//!
//! A [`Patient`] is projected into a [`FlatStringPatient`]: every value is
//! display-ready text, missing values render as [`MISSING`], the first
//! primary address is mirrored into `address`/`street`/`city`/`state`/`zip`,
//! and custom fields are carried along as their text form.

mod cache;

pub use cache::*;

use crate::models::{keys, Address, DateOfBirth, FlatStringPatient, Patient, MISSING};

/// Keys of the built-in registry fields produced by the fixed part of the
/// projection. Custom values stored under one of these names are not copied;
/// any other custom value is, overriding the `timestamp`/`is_seed` metadata.
pub const RESERVED_KEYS: [&str; 15] = [
    keys::ID,
    keys::FIRST_NAME,
    keys::MIDDLE_NAME,
    keys::LAST_NAME,
    keys::SEX,
    keys::GENDER,
    keys::PHONE,
    keys::NOTES,
    keys::STATUS,
    keys::DOB,
    keys::ADDRESS,
    keys::STREET,
    keys::CITY,
    keys::STATE,
    keys::ZIP,
];

/// Project a patient into its flat string form.
pub fn flatten(patient: &Patient) -> FlatStringPatient {
    let mut flat = FlatStringPatient::new();
    flat.insert(keys::ID, patient.id.as_str());
    flat.insert(keys::FIRST_NAME, patient.first_name.as_str());
    flat.insert(keys::MIDDLE_NAME, patient.middle_name.as_str());
    flat.insert(keys::LAST_NAME, patient.last_name.as_str());
    flat.insert(keys::GENDER, patient.gender.as_str());
    flat.insert(keys::NOTES, patient.notes.as_str());
    flat.insert(keys::PHONE, patient.phone.as_str());
    flat.insert(keys::STATUS, patient.status.as_str());
    flat.insert(keys::SEX, patient.sex.as_str());
    flat.insert(keys::DOB, format_dob(patient.dob.as_ref()));

    match patient.primary_address() {
        Some(primary) => {
            flat.insert(keys::ADDRESS, flatten_address(Some(primary)));
            flat.insert(keys::CITY, primary.city.as_str());
            flat.insert(keys::STATE, primary.state.as_str());
            flat.insert(keys::ZIP, primary.zip.as_str());
            flat.insert(keys::STREET, primary.street.as_str());
        }
        None => {
            for key in [keys::ADDRESS, keys::CITY, keys::STATE, keys::ZIP, keys::STREET] {
                flat.insert(key, MISSING);
            }
        }
    }

    if patient.is_seed {
        flat.insert(keys::IS_SEED, "true");
    }
    if let Some(timestamp) = patient.timestamp {
        flat.insert(keys::TIMESTAMP, timestamp.to_rfc3339());
    }

    for (key, value) in custom_fields_as_text(patient) {
        flat.insert(key, value);
    }

    flat
}

/// One-line address rendering: `"{street} {city},{state} {zip}"`.
///
/// Returns `""` (not [`MISSING`]) when there is no address or all four text
/// fields are empty.
pub fn flatten_address(address: Option<&Address>) -> String {
    match address {
        Some(a) if !a.is_blank() => format!("{} {},{} {}", a.street, a.city, a.state, a.zip),
        _ => String::new(),
    }
}

/// Custom field values rendered as text, in key order.
pub fn custom_fields_as_text(patient: &Patient) -> Vec<(String, String)> {
    patient
        .custom
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.to_string()))
        .collect()
}

/// `MM/DD/YYYY` for a stored timestamp, [`MISSING`] for anything else.
pub fn format_dob(dob: Option<&DateOfBirth>) -> String {
    match dob {
        Some(DateOfBirth::Timestamp(ts)) => ts.date_naive().format("%m/%d/%Y").to_string(),
        _ => MISSING.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomValue, PatientStatus};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn ames_patient() -> Patient {
        let mut patient = Patient::new("Ada", "Lovelace");
        patient.dob = None;
        patient.addresses = vec![Address::new("1 Main", "Ames", "IA", "50010", true)];
        patient
    }

    #[test]
    fn test_primary_address_projection() {
        let flat = flatten(&ames_patient());
        assert_eq!(flat.get("address"), Some("1 Main Ames,IA 50010"));
        assert_eq!(flat.get("street"), Some("1 Main"));
        assert_eq!(flat.get("city"), Some("Ames"));
        assert_eq!(flat.get("state"), Some("IA"));
        assert_eq!(flat.get("zip"), Some("50010"));
        assert_eq!(flat.get("dob"), Some("-"));
    }

    #[test]
    fn test_no_primary_address() {
        let mut patient = ames_patient();
        patient.addresses[0].is_primary = false;
        let flat = flatten(&patient);
        for key in ["address", "street", "city", "state", "zip"] {
            assert_eq!(flat.get(key), Some("-"), "key {}", key);
        }

        patient.addresses.clear();
        let flat = flatten(&patient);
        assert_eq!(flat.get("address"), Some("-"));
    }

    #[test]
    fn test_blank_primary_address_renders_empty() {
        let patient = Patient::empty();
        let flat = flatten(&patient);
        assert_eq!(flat.get("address"), Some(""));
        assert_eq!(flat.get("city"), Some(""));
    }

    #[test]
    fn test_flatten_address_sentinels() {
        assert_eq!(flatten_address(None), "");
        assert_eq!(flatten_address(Some(&Address::empty(true))), "");

        let partial = Address::new("", "Ames", "", "", false);
        assert_eq!(flatten_address(Some(&partial)), " Ames, ");
    }

    #[test]
    fn test_dob_formatting() {
        let stored = DateOfBirth::Timestamp(Utc.with_ymd_and_hms(1990, 3, 7, 12, 0, 0).unwrap());
        assert_eq!(format_dob(Some(&stored)), "03/07/1990");

        let edited = DateOfBirth::Date(NaiveDate::from_ymd_opt(1990, 3, 7).unwrap());
        assert_eq!(format_dob(Some(&edited)), "-");
        assert_eq!(format_dob(None), "-");
    }

    #[test]
    fn test_custom_fields_stringified() {
        let mut patient = ames_patient();
        patient.custom.insert("smoker".into(), CustomValue::Bool(false));
        patient.custom.insert("visits".into(), CustomValue::Number(0.0));
        patient.custom.insert("allergies".into(), "penicillin".into());

        let flat = flatten(&patient);
        assert_eq!(flat.get("smoker"), Some("false"));
        assert_eq!(flat.get("visits"), Some("0"));
        assert_eq!(flat.get("allergies"), Some("penicillin"));
    }

    #[test]
    fn test_reserved_custom_key_ignored() {
        let mut patient = ames_patient();
        patient.custom.insert("state".into(), "overridden".into());
        let flat = flatten(&patient);
        assert_eq!(flat.get("state"), Some("IA"));
    }

    #[test]
    fn test_custom_fields_named_like_record_keys_are_kept() {
        let mut patient = ames_patient();
        patient.timestamp = Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        patient.custom.insert("addresses".into(), "two".into());
        patient.custom.insert("timestamp".into(), "yesterday".into());
        patient.custom.insert("is_seed".into(), CustomValue::Bool(false));

        let flat = flatten(&patient);
        assert_eq!(flat.get("addresses"), Some("two"));
        assert_eq!(flat.get("timestamp"), Some("yesterday"));
        assert_eq!(flat.get("is_seed"), Some("false"));
    }

    #[test]
    fn test_status_and_metadata() {
        let mut patient = ames_patient();
        patient.status = PatientStatus::Onboarding;
        patient.is_seed = true;
        patient.timestamp = Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());

        let flat = flatten(&patient);
        assert_eq!(flat.get("status"), Some("onboarding"));
        assert_eq!(flat.get("is_seed"), Some("true"));
        assert_eq!(flat.get("timestamp"), Some("2024-01-02T03:04:05+00:00"));
    }

    #[test]
    fn test_deterministic() {
        let patient = ames_patient();
        assert_eq!(flatten(&patient), flatten(&patient));
    }
}
