//! Clinic Records Core Library
//!
//! Local-first patient record management for a small clinic: a configurable
//! field registry, flattening of nested patient records into display rows,
//! a sortable/searchable/paginated patients table and patient form
//! validation.
//!
//! # Architecture
//!
//! ```text
//!   Settings snapshots (append-only)          Patient records (per user)
//!              │                                         │
//!              ▼                                         ▼
//!     Session ─ AppSettings ─┐                  RecordStore::subscribe
//!                            │                           │
//!        ┌───────────────────┼───────────────┐           ▼
//!        │                   │               │       flatten (cached)
//!        ▼                   ▼               ▼           │
//!  headers_for_table   is_submittable   settings edits   ▼
//!        │              (PatientForm)   (add/remove/  TableState::view
//!        └──────────────────┬───────────  toggle)        │
//!                           ▼                            │
//!                     patients table ◄───────────────────┘
//! ```
//!
//! # Core Principle
//!
//! **Every pure function takes the settings snapshot as an argument.** Only
//! the [`Session`] at the application shell follows the live settings.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Patient, DataField, AppSettings, FlatStringPatient)
//! - [`flatten`]: Patient → FlatStringPatient projection and its cache
//! - [`registry`]: Field registry ordering, naming rules and settings edits
//! - [`form`]: Submission gate and patient form state
//! - [`table`]: Stable sort, search and pagination
//! - [`detail`]: Patient detail view
//! - [`db`]: SQLite persistence
//! - [`store`]: Record/settings/identity collaborators and the local store
//! - [`session`]: Live settings holder
//! - [`seed`]: Demo data generation

pub mod db;
pub mod detail;
pub mod flatten;
pub mod form;
pub mod models;
pub mod registry;
pub mod seed;
pub mod session;
pub mod store;
pub mod table;

// Re-export commonly used types
pub use db::Database;
pub use detail::{patient_detail, PatientDetail};
pub use flatten::{flatten, flatten_address, FlattenCache};
pub use form::{is_submittable, PatientForm};
pub use models::{
    default_fields, Address, AppSettings, CustomValue, DataField, DateOfBirth,
    FlatStringPatient, InputType, Patient, PatientStatus,
};
pub use registry::{headers_for_table, is_valid_new_field, keyed_by_field_name};
pub use session::Session;
pub use store::{
    IdentityProvider, LocalStore, PatientFilter, RecordStore, SettingsStore, StaticIdentity,
    Subscription,
};
pub use table::{stable_sort, SortOrder, TableState};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Settings error: {0}")]
    SettingsError(String),

    #[error("Store error: {0}")]
    StoreError(String),
}

impl From<db::DbError> for ClinicError {
    fn from(e: db::DbError) -> Self {
        ClinicError::DatabaseError(e.to_string())
    }
}

impl From<registry::SettingsError> for ClinicError {
    fn from(e: registry::SettingsError) -> Self {
        ClinicError::SettingsError(e.to_string())
    }
}

impl From<registry::FieldValueError> for ClinicError {
    fn from(e: registry::FieldValueError) -> Self {
        ClinicError::InvalidInput(e.to_string())
    }
}

impl From<form::FormError> for ClinicError {
    fn from(e: form::FormError) -> Self {
        ClinicError::InvalidInput(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path for `user_id`.
#[uniffi::export]
pub fn open_database(path: String, user_id: Option<String>) -> Result<Arc<ClinicCore>, ClinicError> {
    let store = LocalStore::open(&path, StaticIdentity(user_id))?;
    Ok(Arc::new(ClinicCore::new(store)))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory(user_id: Option<String>) -> Result<Arc<ClinicCore>, ClinicError> {
    let store = LocalStore::open_in_memory(StaticIdentity(user_id))?;
    Ok(Arc::new(ClinicCore::new(store)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe store wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    store: LocalStore,
    session: Session,
    cache: Mutex<FlattenCache>,
}

impl ClinicCore {
    fn new(store: LocalStore) -> Self {
        let session = Session::start(&store);
        Self {
            store,
            session,
            cache: Mutex::new(FlattenCache::new()),
        }
    }

    fn save_settings(&self, settings: &AppSettings) -> Result<(), ClinicError> {
        if self.store.append_settings(settings) {
            Ok(())
        } else {
            Err(ClinicError::StoreError("settings were not saved".into()))
        }
    }
}

#[uniffi::export]
impl ClinicCore {
    /// The signed-in user, if any.
    pub fn user_id(&self) -> Option<String> {
        self.store.user_id()
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a patient. Returns the new id.
    pub fn create_patient(&self, patient: FfiPatient) -> Result<String, ClinicError> {
        let patient = Patient::try_from(patient)?;
        registry::validate_custom_fields(&patient, &self.session.settings().patient_data_settings)?;
        let id = self.store.create_patient(&patient);
        if id.is_empty() {
            return Err(ClinicError::StoreError("patient was not created".into()));
        }
        Ok(id)
    }

    /// Replace a patient. Returns the id.
    pub fn update_patient(&self, id: String, patient: FfiPatient) -> Result<String, ClinicError> {
        let patient = Patient::try_from(patient)?;
        registry::validate_custom_fields(&patient, &self.session.settings().patient_data_settings)?;
        let updated = self.store.update_patient(&id, &patient);
        if updated.is_empty() {
            return Err(ClinicError::StoreError(format!("patient {} was not updated", id)));
        }
        Ok(updated)
    }

    /// Get a patient by id.
    pub fn get_patient(&self, id: String) -> Option<FfiPatient> {
        self.store.get_patient(&id).map(Into::into)
    }

    /// List patients, optionally filtered by exact first/last name.
    pub fn list_patients(&self, first_name: Option<String>, last_name: Option<String>) -> Vec<FfiPatient> {
        let filter = PatientFilter {
            first_name,
            last_name,
        };
        self.store
            .list_patients(&filter)
            .into_iter()
            .map(Into::into)
            .collect()
    }

    /// The patient page for `id`.
    pub fn patient_detail(&self, id: String) -> Result<FfiPatientDetail, ClinicError> {
        let patient = self
            .store
            .get_patient(&id)
            .ok_or_else(|| ClinicError::NotFound(format!("patient {}", id)))?;
        let detail = patient_detail(&patient, &self.session.settings().patient_data_settings);
        Ok(detail.into())
    }

    // =========================================================================
    // Table Operations
    // =========================================================================

    /// Visible table columns, in display order.
    pub fn table_headers(&self) -> Vec<FfiHeader> {
        let settings = self.session.settings();
        let names = registry::display_name_map(&settings.patient_data_settings);
        headers_for_table(&settings.patient_data_settings)
            .into_iter()
            .map(|field_name| FfiHeader {
                display_name: names.get(&field_name).cloned().unwrap_or_default(),
                field_name,
            })
            .collect()
    }

    /// One page of the patients table.
    pub fn table_page(&self, query: FfiTableQuery) -> FfiTablePage {
        let patients = self.store.list_patients(&PatientFilter::default());
        let rows = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flatten_snapshot(&patients);

        let mut state = TableState::new();
        if let Some(order_by) = query.order_by {
            state.order_by = order_by;
        }
        state.order = if query.descending { SortOrder::Desc } else { SortOrder::Asc };
        state.set_rows_per_page(query.rows_per_page as usize);
        state.set_search(&query.search);
        state.set_page(query.page as usize);

        let view = state.view(&rows);
        let headers = self.table_headers();
        let rows = view
            .rows
            .iter()
            .map(|row| FfiTableRow {
                id: row.id().to_string(),
                cells: headers
                    .iter()
                    .map(|h| table::cell_text(row, &h.field_name).to_string())
                    .collect(),
            })
            .collect();

        FfiTablePage {
            headers,
            rows,
            empty_rows: view.empty_rows as u32,
            total: view.total as u32,
            page_count: state.page_count(view.total) as u32,
        }
    }

    // =========================================================================
    // Settings Operations
    // =========================================================================

    /// Fields listed in the data settings panel.
    pub fn settings_fields(&self) -> Vec<FfiDataField> {
        let settings = self.session.settings();
        registry::listed_fields(&settings.patient_data_settings)
            .into_iter()
            .map(Into::into)
            .collect()
    }

    /// Check a proposed custom field display name.
    pub fn is_valid_new_field(&self, input: String) -> bool {
        is_valid_new_field(&input, &self.session.settings().patient_data_settings)
    }

    /// Add a custom field (hidden from the table, not required).
    pub fn add_custom_field(&self, display_name: String, input_type: String) -> Result<(), ClinicError> {
        let input_type = InputType::parse(&input_type)
            .ok_or_else(|| ClinicError::InvalidInput(format!("input type {}", input_type)))?;
        let next = registry::add_custom_field(&self.session.settings(), &display_name, input_type)?;
        self.save_settings(&next)
    }

    /// Remove a custom field.
    pub fn remove_custom_field(&self, field_name: String) -> Result<(), ClinicError> {
        let next = registry::remove_custom_field(&self.session.settings(), &field_name)?;
        self.save_settings(&next)
    }

    /// Show a hidden column at the end of the table, or hide a shown one.
    pub fn toggle_table_header(&self, field_name: String) -> Result<(), ClinicError> {
        let next = registry::toggle_table_header(&self.session.settings(), &field_name)?;
        self.save_settings(&next)
    }

    // =========================================================================
    // Form Operations
    // =========================================================================

    /// Whether `draft` can be submitted.
    pub fn is_submittable(&self, draft: FfiPatient) -> bool {
        match Patient::try_from(draft) {
            Ok(patient) => is_submittable(&patient, &self.session.keyed_fields()),
            Err(e) => {
                log::warn!("unreadable draft: {}", e);
                false
            }
        }
    }

    /// First required field the draft leaves empty.
    pub fn first_missing_required(&self, draft: FfiPatient) -> Result<Option<String>, ClinicError> {
        let patient = Patient::try_from(draft)?;
        Ok(form::first_missing_required(&patient, &self.session.keyed_fields()))
    }

    /// An empty new-patient draft.
    pub fn empty_patient(&self) -> FfiPatient {
        Patient::empty().into()
    }

    // =========================================================================
    // Seed Data
    // =========================================================================

    /// Create `count` demo patients. Returns their ids.
    pub fn create_seed_data(&self, count: u32) -> Vec<String> {
        let patients = seed::generate_seed_data(count as usize, &mut seed::FixtureSeedSource::new());
        self.store.create_seed_data(patients)
    }

    /// Delete demo patients. Returns how many were removed.
    pub fn delete_seed_data(&self) -> u32 {
        self.store.delete_seed_data() as u32
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe date of birth.
#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum FfiDateOfBirth {
    /// Stored timestamp, milliseconds since the epoch.
    Timestamp { epoch_millis: i64 },
    /// Calendar date picked in a form.
    Date { year: i32, month: u32, day: u32 },
}

impl From<DateOfBirth> for FfiDateOfBirth {
    fn from(dob: DateOfBirth) -> Self {
        match dob {
            DateOfBirth::Timestamp(ts) => FfiDateOfBirth::Timestamp {
                epoch_millis: ts.timestamp_millis(),
            },
            DateOfBirth::Date(d) => FfiDateOfBirth::Date {
                year: d.year(),
                month: d.month(),
                day: d.day(),
            },
        }
    }
}

impl TryFrom<FfiDateOfBirth> for DateOfBirth {
    type Error = ClinicError;

    fn try_from(dob: FfiDateOfBirth) -> Result<Self, Self::Error> {
        match dob {
            FfiDateOfBirth::Timestamp { epoch_millis } => DateTime::<Utc>::from_timestamp_millis(epoch_millis)
                .map(DateOfBirth::Timestamp)
                .ok_or_else(|| ClinicError::InvalidInput(format!("timestamp {}", epoch_millis))),
            FfiDateOfBirth::Date { year, month, day } => NaiveDate::from_ymd_opt(year, month, day)
                .map(DateOfBirth::Date)
                .ok_or_else(|| ClinicError::InvalidInput(format!("date {}-{}-{}", year, month, day))),
        }
    }
}

/// FFI-safe custom field value.
#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum FfiCustomValue {
    Bool { value: bool },
    Number { value: f64 },
    Text { value: String },
}

impl From<CustomValue> for FfiCustomValue {
    fn from(value: CustomValue) -> Self {
        match value {
            CustomValue::Bool(value) => FfiCustomValue::Bool { value },
            CustomValue::Number(value) => FfiCustomValue::Number { value },
            CustomValue::Text(value) => FfiCustomValue::Text { value },
        }
    }
}

impl From<FfiCustomValue> for CustomValue {
    fn from(value: FfiCustomValue) -> Self {
        match value {
            FfiCustomValue::Bool { value } => CustomValue::Bool(value),
            FfiCustomValue::Number { value } => CustomValue::Number(value),
            FfiCustomValue::Text { value } => CustomValue::Text(value),
        }
    }
}

/// FFI-safe address.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub is_primary: bool,
}

impl From<Address> for FfiAddress {
    fn from(a: Address) -> Self {
        Self {
            street: a.street,
            city: a.city,
            state: a.state,
            zip: a.zip,
            is_primary: a.is_primary,
        }
    }
}

impl From<FfiAddress> for Address {
    fn from(a: FfiAddress) -> Self {
        Address {
            street: a.street,
            city: a.city,
            state: a.state,
            zip: a.zip,
            is_primary: a.is_primary,
            extra: BTreeMap::new(),
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub sex: String,
    pub gender: String,
    pub phone: String,
    pub notes: String,
    pub status: String,
    pub dob: Option<FfiDateOfBirth>,
    pub addresses: Vec<FfiAddress>,
    pub is_seed: bool,
    pub custom: std::collections::HashMap<String, FfiCustomValue>,
}

impl From<Patient> for FfiPatient {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id,
            first_name: p.first_name,
            middle_name: p.middle_name,
            last_name: p.last_name,
            sex: p.sex,
            gender: p.gender,
            phone: p.phone,
            notes: p.notes,
            status: p.status.as_str().to_string(),
            dob: p.dob.map(Into::into),
            addresses: p.addresses.into_iter().map(Into::into).collect(),
            is_seed: p.is_seed,
            custom: p.custom.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

impl TryFrom<FfiPatient> for Patient {
    type Error = ClinicError;

    fn try_from(p: FfiPatient) -> Result<Self, Self::Error> {
        let status = PatientStatus::parse(&p.status)
            .ok_or_else(|| ClinicError::InvalidInput(format!("status {}", p.status)))?;
        Ok(Patient {
            id: p.id,
            first_name: p.first_name,
            middle_name: p.middle_name,
            last_name: p.last_name,
            sex: p.sex,
            gender: p.gender,
            phone: p.phone,
            notes: p.notes,
            status,
            dob: p.dob.map(DateOfBirth::try_from).transpose()?,
            addresses: p.addresses.into_iter().map(Into::into).collect(),
            is_seed: p.is_seed,
            timestamp: None,
            custom: p.custom.into_iter().map(|(k, v)| (k, v.into())).collect(),
        })
    }
}

/// FFI-safe registry entry as listed in the settings panel.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDataField {
    pub field_name: String,
    pub display_name: String,
    pub type_label: String,
    pub shown_in_table: bool,
    pub table_configurable: bool,
    pub required: bool,
    pub custom: bool,
}

impl From<&DataField> for FfiDataField {
    fn from(f: &DataField) -> Self {
        Self {
            field_name: f.field_name.clone(),
            display_name: f.display_name.clone(),
            type_label: f.type_label().as_str().to_string(),
            shown_in_table: f.is_shown_in_table(),
            table_configurable: f.is_table_configurable(),
            required: f.is_required_on_patient_form,
            custom: f.is_non_default_field,
        }
    }
}

/// FFI-safe table column.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHeader {
    pub field_name: String,
    pub display_name: String,
}

/// Table request from the shell.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTableQuery {
    pub search: String,
    pub order_by: Option<String>,
    pub descending: bool,
    pub page: u32,
    pub rows_per_page: u32,
}

/// One rendered table row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTableRow {
    pub id: String,
    /// One cell per header, `-` when empty
    pub cells: Vec<String>,
}

/// One rendered table page.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTablePage {
    pub headers: Vec<FfiHeader>,
    pub rows: Vec<FfiTableRow>,
    pub empty_rows: u32,
    pub total: u32,
    pub page_count: u32,
}

/// FFI-safe labelled custom value.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDetailField {
    pub label: String,
    pub value: String,
}

/// FFI-safe patient page.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientDetail {
    pub title: String,
    pub status: String,
    pub dob: String,
    pub sex: String,
    pub gender: String,
    pub phone: String,
    pub primary_address: String,
    pub mailing_address: Option<String>,
    pub notes: String,
    pub custom_fields: Vec<FfiDetailField>,
}

impl From<PatientDetail> for FfiPatientDetail {
    fn from(d: PatientDetail) -> Self {
        Self {
            title: d.title,
            status: d.status.as_str().to_string(),
            dob: d.dob,
            sex: d.sex,
            gender: d.gender,
            phone: d.phone,
            primary_address: d.primary_address,
            mailing_address: d.mailing_address,
            notes: d.notes,
            custom_fields: d
                .custom_fields
                .into_iter()
                .map(|f| FfiDetailField {
                    label: f.label,
                    value: f.value,
                })
                .collect(),
        }
    }
}
