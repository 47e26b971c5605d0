//! Field registry: ordering helpers and the settings editor.
//!
//! Every operation takes the registry (or settings snapshot) it works on and
//! returns a new value; nothing here edits a registry in place. Callers
//! persist the complete returned snapshot.

mod validation;

pub use validation::*;

use std::collections::HashMap;

use thiserror::Error;

use crate::models::{AppSettings, DataField, InputType, HEADER_HIDDEN};

/// Settings editor errors.
#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("Invalid field name: {0:?}")]
    InvalidFieldName(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Built-in field cannot be removed: {0}")]
    BuiltinField(String),

    #[error("Field cannot be shown in the table: {0}")]
    NotConfigurable(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Map of field name to field definition.
pub type KeyedDataFields = HashMap<String, DataField>;

/// Field names of the table columns, left to right.
///
/// Only fields with a header index above `-1` are included. Fields sharing
/// an index keep their registry order.
pub fn headers_for_table(fields: &[DataField]) -> Vec<String> {
    let mut shown: Vec<&DataField> = fields.iter().filter(|f| f.is_shown_in_table()).collect();
    shown.sort_by_key(|f| f.patients_table_header_index);
    shown.into_iter().map(|f| f.field_name.clone()).collect()
}

/// Field name to display name. Later duplicates overwrite earlier ones.
pub fn display_name_map(fields: &[DataField]) -> HashMap<String, String> {
    let mut map = HashMap::with_capacity(fields.len());
    for field in fields {
        map.insert(field.field_name.clone(), field.display_name.clone());
    }
    map
}

/// Field name to field definition. Later duplicates overwrite earlier ones.
pub fn keyed_by_field_name(fields: &[DataField]) -> KeyedDataFields {
    let mut map = HashMap::with_capacity(fields.len());
    for field in fields {
        map.insert(field.field_name.clone(), field.clone());
    }
    map
}

/// Fields listed in the data settings panel (everything but the derived
/// address line and the id).
pub fn listed_fields(fields: &[DataField]) -> Vec<&DataField> {
    fields
        .iter()
        .filter(|f| f.field_name != crate::models::keys::ADDRESS)
        .filter(|f| f.field_name != crate::models::keys::ID)
        .collect()
}

/// New registry with `field` appended.
pub fn add_field(fields: &[DataField], field: DataField) -> Vec<DataField> {
    let mut next = fields.to_vec();
    next.push(field);
    next
}

/// New registry without any field named `field_name`.
pub fn remove_field(fields: &[DataField], field_name: &str) -> Vec<DataField> {
    fields
        .iter()
        .filter(|f| f.field_name != field_name)
        .cloned()
        .collect()
}

/// Create a custom field from settings input.
///
/// The returned snapshot has its timestamp cleared so the store stamps it on
/// append.
pub fn add_custom_field(
    settings: &AppSettings,
    input: &str,
    input_type: InputType,
) -> SettingsResult<AppSettings> {
    let fields = &settings.patient_data_settings;
    if !is_valid_new_field(input, fields) {
        return Err(SettingsError::InvalidFieldName(input.to_string()));
    }
    let field = DataField::custom(&derive_field_name(input), input, input_type);
    Ok(settings.with_fields(add_field(fields, field)))
}

/// Delete a custom field. Built-in fields are immutable.
pub fn remove_custom_field(settings: &AppSettings, field_name: &str) -> SettingsResult<AppSettings> {
    let field = settings
        .field(field_name)
        .ok_or_else(|| SettingsError::UnknownField(field_name.to_string()))?;
    if !field.is_non_default_field {
        return Err(SettingsError::BuiltinField(field_name.to_string()));
    }
    Ok(settings.with_fields(remove_field(&settings.patient_data_settings, field_name)))
}

/// Show a hidden field as the right-most column, or hide a shown one.
pub fn toggle_table_header(settings: &AppSettings, field_name: &str) -> SettingsResult<AppSettings> {
    let fields = &settings.patient_data_settings;
    let field = settings
        .field(field_name)
        .ok_or_else(|| SettingsError::UnknownField(field_name.to_string()))?;
    if !field.is_table_configurable() {
        return Err(SettingsError::NotConfigurable(field_name.to_string()));
    }

    let next_index = if field.patients_table_header_index == HEADER_HIDDEN {
        fields
            .iter()
            .map(|f| f.patients_table_header_index)
            .max()
            .unwrap_or(HEADER_HIDDEN)
            + 1
    } else {
        HEADER_HIDDEN
    };

    let next = fields
        .iter()
        .map(|f| {
            if f.field_name == field_name {
                DataField {
                    patients_table_header_index: next_index,
                    ..f.clone()
                }
            } else {
                f.clone()
            }
        })
        .collect();
    Ok(settings.with_fields(next))
}
