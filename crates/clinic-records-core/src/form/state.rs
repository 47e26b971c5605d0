//! Interactive patient form state.

use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

use super::is_submittable;
use crate::models::{keys, Address, AppSettings, DataField, DateOfBirth, Patient, PatientStatus};
use crate::registry::{coerce_custom_input, keyed_by_field_name, FieldValueError, KeyedDataFields};

/// Form editing errors.
#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    #[error("Field is not editable as text: {0}")]
    NotTextField(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error(transparent)]
    Value(#[from] FieldValueError),
}

pub type FormResult<T> = Result<T, FormError>;

/// Focus history of one input.
///
/// An input shows an error only once it has been focused and then blurred
/// while required and empty. Untouched inputs never show one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInteraction {
    initialized: bool,
    blurred: bool,
}

impl Default for FieldInteraction {
    fn default() -> Self {
        Self {
            initialized: false,
            blurred: true,
        }
    }
}

impl FieldInteraction {
    pub fn focus(&mut self) {
        self.initialized = true;
        self.blurred = false;
    }

    pub fn blur(&mut self) {
        self.blurred = true;
    }

    pub fn shows_error(&self, required: bool, value: &str) -> bool {
        required && self.initialized && self.blurred && value.is_empty()
    }
}

/// Which of the two address rows an input belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressSlot {
    Primary,
    Mailing,
}

impl AddressSlot {
    fn index(self) -> usize {
        match self {
            AddressSlot::Primary => 0,
            AddressSlot::Mailing => 1,
        }
    }

    fn label(self) -> &'static str {
        match self {
            AddressSlot::Primary => "primary",
            AddressSlot::Mailing => "mailing",
        }
    }
}

/// One text part of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressPart {
    Street,
    City,
    State,
    Zip,
}

impl AddressPart {
    pub const ALL: [AddressPart; 4] = [
        AddressPart::Street,
        AddressPart::City,
        AddressPart::State,
        AddressPart::Zip,
    ];

    pub fn field_name(self) -> &'static str {
        match self {
            AddressPart::Street => keys::STREET,
            AddressPart::City => keys::CITY,
            AddressPart::State => keys::STATE,
            AddressPart::Zip => keys::ZIP,
        }
    }

    fn value(self, address: &Address) -> &str {
        match self {
            AddressPart::Street => &address.street,
            AddressPart::City => &address.city,
            AddressPart::State => &address.state,
            AddressPart::Zip => &address.zip,
        }
    }

    fn value_mut(self, address: &mut Address) -> &mut String {
        match self {
            AddressPart::Street => &mut address.street,
            AddressPart::City => &mut address.city,
            AddressPart::State => &mut address.state,
            AddressPart::Zip => &mut address.zip,
        }
    }
}

/// Input key of an address part, e.g. `primary-street`.
pub fn address_input_key(slot: AddressSlot, part: AddressPart) -> String {
    format!("{}-{}", slot.label(), part.field_name())
}

/// Whether the form creates a record or edits one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    New,
    Edit,
}

const NAME_FIELDS: [&str; 3] = [keys::FIRST_NAME, keys::MIDDLE_NAME, keys::LAST_NAME];

/// A patient draft being edited against a registry snapshot.
pub struct PatientForm {
    mode: FormMode,
    draft: Patient,
    fields: Vec<DataField>,
    keyed: KeyedDataFields,
    interactions: HashMap<String, FieldInteraction>,
}

impl PatientForm {
    /// Form for a new patient, starting from the empty record.
    pub fn new_patient(settings: &AppSettings) -> Self {
        Self::with_draft(FormMode::New, Patient::empty(), settings)
    }

    /// Form editing an existing patient.
    pub fn edit(patient: Patient, settings: &AppSettings) -> Self {
        Self::with_draft(FormMode::Edit, patient, settings)
    }

    fn with_draft(mode: FormMode, draft: Patient, settings: &AppSettings) -> Self {
        let fields = settings.patient_data_settings.clone();
        let keyed = keyed_by_field_name(&fields);
        Self {
            mode,
            draft,
            fields,
            keyed,
            interactions: HashMap::new(),
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            FormMode::New => "New Patient Form",
            FormMode::Edit => "Edit Patient Form",
        }
    }

    pub fn draft(&self) -> &Patient {
        &self.draft
    }

    /// Label of a registry field, falling back to its name.
    pub fn label(&self, field_name: &str) -> String {
        self.keyed
            .get(field_name)
            .map(|f| f.display_name.clone())
            .unwrap_or_else(|| field_name.to_string())
    }

    /// Label of an address input, e.g. "Primary Street".
    pub fn address_label(&self, slot: AddressSlot, part: AddressPart) -> String {
        let prefix = match slot {
            AddressSlot::Primary => "Primary",
            AddressSlot::Mailing => "Mailing",
        };
        format!("{} {}", prefix, self.label(part.field_name()))
    }

    /// Custom fields rendered below the built-in inputs, in registry order.
    pub fn custom_fields(&self) -> Vec<&DataField> {
        self.fields.iter().filter(|f| f.is_non_default_field).collect()
    }

    pub fn set_text(&mut self, field_name: &str, value: &str) -> FormResult<()> {
        let target = match field_name {
            keys::FIRST_NAME => &mut self.draft.first_name,
            keys::MIDDLE_NAME => &mut self.draft.middle_name,
            keys::LAST_NAME => &mut self.draft.last_name,
            keys::SEX => &mut self.draft.sex,
            keys::GENDER => &mut self.draft.gender,
            keys::PHONE => &mut self.draft.phone,
            keys::NOTES => &mut self.draft.notes,
            other => return Err(FormError::NotTextField(other.to_string())),
        };
        *target = value.to_string();
        Ok(())
    }

    pub fn set_status(&mut self, status: PatientStatus) {
        self.draft.status = status;
    }

    /// Set the date of birth from the date picker. The value stays an
    /// in-memory date until the record is stored.
    pub fn set_dob(&mut self, date: NaiveDate) {
        self.draft.dob = Some(DateOfBirth::Date(date));
    }

    /// Date shown in the date picker.
    pub fn dob_date(&self) -> Option<NaiveDate> {
        self.draft.dob.as_ref().map(DateOfBirth::to_date)
    }

    pub fn set_address(&mut self, slot: AddressSlot, part: AddressPart, value: &str) {
        let index = slot.index();
        while self.draft.addresses.len() <= index {
            let is_primary = self.draft.addresses.is_empty();
            self.draft.addresses.push(Address::empty(is_primary));
        }
        *part.value_mut(&mut self.draft.addresses[index]) = value.to_string();
    }

    pub fn address_value(&self, slot: AddressSlot, part: AddressPart) -> &str {
        self.draft
            .addresses
            .get(slot.index())
            .map(|a| part.value(a))
            .unwrap_or("")
    }

    /// Set a custom field from raw input, typed by its declared input type.
    pub fn set_custom(&mut self, field_name: &str, raw: &str) -> FormResult<()> {
        let field = self
            .keyed
            .get(field_name)
            .ok_or_else(|| FormError::UnknownField(field_name.to_string()))?;
        let value = coerce_custom_input(field, raw)?;
        self.draft.custom.insert(field_name.to_string(), value);
        Ok(())
    }

    pub fn focus(&mut self, input_key: &str) {
        self.interactions
            .entry(input_key.to_string())
            .or_default()
            .focus();
    }

    pub fn blur(&mut self, input_key: &str) {
        self.interactions
            .entry(input_key.to_string())
            .or_default()
            .blur();
    }

    /// Whether the input keyed `input_key` shows its error message.
    pub fn shows_error(&self, input_key: &str) -> bool {
        let interaction = self.interactions.get(input_key).copied().unwrap_or_default();
        let (required, value) = self.input_requirement(input_key);
        interaction.shows_error(required, &value)
    }

    fn input_requirement(&self, input_key: &str) -> (bool, String) {
        for slot in [AddressSlot::Primary, AddressSlot::Mailing] {
            for part in AddressPart::ALL {
                if address_input_key(slot, part) == input_key {
                    return (
                        slot == AddressSlot::Primary,
                        self.address_value(slot, part).to_string(),
                    );
                }
            }
        }

        // Name inputs are always marked required on the form.
        let required = NAME_FIELDS.contains(&input_key)
            || self
                .keyed
                .get(input_key)
                .is_some_and(|f| f.is_required_on_patient_form);
        let value = match input_key {
            keys::FIRST_NAME => self.draft.first_name.clone(),
            keys::MIDDLE_NAME => self.draft.middle_name.clone(),
            keys::LAST_NAME => self.draft.last_name.clone(),
            keys::SEX => self.draft.sex.clone(),
            keys::GENDER => self.draft.gender.clone(),
            keys::PHONE => self.draft.phone.clone(),
            keys::NOTES => self.draft.notes.clone(),
            other => self
                .draft
                .custom
                .get(other)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        };
        (required, value)
    }

    pub fn can_submit(&self) -> bool {
        is_submittable(&self.draft, &self.keyed)
    }

    /// The draft to hand to the record store, if submission is allowed.
    pub fn submit(&self) -> Option<Patient> {
        if self.can_submit() {
            Some(self.draft.clone())
        } else {
            None
        }
    }
}
