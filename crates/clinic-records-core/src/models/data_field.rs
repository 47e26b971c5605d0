//! Data field configuration (the field registry) and settings snapshots.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::flat::keys;

/// Table header index of a field that exists but is not shown in the table.
pub const HEADER_HIDDEN: i32 = -1;

/// Table header index of a field that must never appear in table settings.
pub const HEADER_NEVER_SHOWN: i32 = -2;

/// Kind of input a custom field is edited with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Number,
    Date,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Number => "number",
            InputType::Date => "date",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(InputType::Text),
            "number" => Some(InputType::Number),
            "date" => Some(InputType::Date),
            _ => None,
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical patient attribute: names, requiredness, table position and
/// input kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataField {
    /// Unique key; also the key of the flattened patient value
    pub field_name: String,
    pub display_name: String,
    /// `>= 0` shown (column order), `-1` hidden, `-2` never configurable
    pub patients_table_header_index: i32,
    pub is_required_on_patient_form: bool,
    /// True for fields created in settings rather than built in
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_non_default_field: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
}

impl DataField {
    /// Built-in field.
    pub fn builtin(field_name: &str, display_name: &str, header_index: i32, required: bool) -> Self {
        Self {
            field_name: field_name.to_string(),
            display_name: display_name.to_string(),
            patients_table_header_index: header_index,
            is_required_on_patient_form: required,
            is_non_default_field: false,
            input_type: None,
        }
    }

    /// Custom field as created from settings: hidden and optional.
    pub fn custom(field_name: &str, display_name: &str, input_type: InputType) -> Self {
        Self {
            field_name: field_name.to_string(),
            display_name: display_name.to_string(),
            patients_table_header_index: HEADER_HIDDEN,
            is_required_on_patient_form: false,
            is_non_default_field: true,
            input_type: Some(input_type),
        }
    }

    pub fn is_shown_in_table(&self) -> bool {
        self.patients_table_header_index > HEADER_HIDDEN
    }

    /// Whether the field may be toggled in table settings.
    pub fn is_table_configurable(&self) -> bool {
        self.patients_table_header_index > HEADER_NEVER_SHOWN
    }

    /// Type label shown next to the field in settings.
    pub fn type_label(&self) -> InputType {
        match self.input_type {
            Some(input_type) => input_type,
            None if self.field_name == keys::DOB => InputType::Date,
            None => InputType::Text,
        }
    }
}

/// The built-in registry every user starts with.
pub fn default_fields() -> Vec<DataField> {
    vec![
        DataField::builtin(keys::FIRST_NAME, "First Name", 0, true),
        DataField::builtin(keys::MIDDLE_NAME, "Middle Name", 1, true),
        DataField::builtin(keys::LAST_NAME, "Last Name", 2, true),
        DataField::builtin(keys::STATUS, "Status", 3, true),
        DataField::builtin(keys::DOB, "Date of Birth", 4, true),
        DataField::builtin(keys::ADDRESS, "Primary Address", 5, true),
        DataField::builtin(keys::SEX, "Sex", HEADER_HIDDEN, true),
        DataField::builtin(keys::GENDER, "Gender", HEADER_HIDDEN, true),
        DataField::builtin(keys::PHONE, "Phone Number", HEADER_HIDDEN, true),
        DataField::builtin(keys::NOTES, "Notes", HEADER_HIDDEN, false),
        DataField::builtin(keys::STREET, "Street", HEADER_HIDDEN, true),
        DataField::builtin(keys::CITY, "City", HEADER_HIDDEN, true),
        DataField::builtin(keys::STATE, "State", HEADER_HIDDEN, true),
        DataField::builtin(keys::ZIP, "Zip Code", HEADER_HIDDEN, true),
        DataField::builtin(keys::ID, "", HEADER_NEVER_SHOWN, false),
    ]
}

/// A versioned registry snapshot. The store keeps every snapshot a user
/// appends; only the most recent one is active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub patient_data_settings: Vec<DataField>,
    /// Stamped by the store on append; `None` for snapshots not yet stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            patient_data_settings: default_fields(),
            timestamp: None,
        }
    }
}

impl AppSettings {
    /// Snapshot with a replaced registry and a cleared timestamp.
    pub fn with_fields(&self, fields: Vec<DataField>) -> Self {
        Self {
            patient_data_settings: fields,
            timestamp: None,
        }
    }

    pub fn field(&self, field_name: &str) -> Option<&DataField> {
        self.patient_data_settings
            .iter()
            .find(|f| f.field_name == field_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fields() {
        let fields = default_fields();
        assert_eq!(fields.len(), 15);

        let notes = fields.iter().find(|f| f.field_name == "notes").unwrap();
        assert!(!notes.is_required_on_patient_form);

        let id = fields.iter().find(|f| f.field_name == "id").unwrap();
        assert!(!id.is_table_configurable());
        assert!(!id.is_shown_in_table());

        let address = fields.iter().find(|f| f.field_name == "address").unwrap();
        assert_eq!(address.patients_table_header_index, 5);
    }

    #[test]
    fn test_type_label() {
        let settings = AppSettings::default();
        assert_eq!(settings.field("dob").unwrap().type_label(), InputType::Date);
        assert_eq!(settings.field("phone").unwrap().type_label(), InputType::Text);

        let weight = DataField::custom("weight", "Weight", InputType::Number);
        assert_eq!(weight.type_label(), InputType::Number);
    }

    #[test]
    fn test_camel_case_json() {
        let field = DataField::custom("blood_type", "Blood Type", InputType::Text);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["fieldName"], "blood_type");
        assert_eq!(json["patientsTableHeaderIndex"], -1);
        assert_eq!(json["isNonDefaultField"], true);
        assert_eq!(json["inputType"], "text");

        let builtin = serde_json::to_value(DataField::builtin("sex", "Sex", -1, true)).unwrap();
        assert!(builtin.get("isNonDefaultField").is_none());
        assert!(builtin.get("inputType").is_none());
    }
}
