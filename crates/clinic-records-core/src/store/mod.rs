//! Record, settings and identity collaborators.
//!
//! The traits here are the only asynchronous boundary of the core. Reads that
//! fail come back empty; writes that fail come back as an empty id. Failures
//! are logged, never raised.

mod local;
mod subscription;

pub use local::*;
pub use subscription::{Callback, Subscription};
pub(crate) use subscription::Listeners;

use serde::{Deserialize, Serialize};

use crate::models::{AppSettings, Patient};

/// Exact-match patient filter. Both parts optional, conjunctive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatientFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl PatientFilter {
    pub fn first_name(name: impl Into<String>) -> Self {
        Self {
            first_name: Some(name.into()),
            last_name: None,
        }
    }

    pub fn last_name(name: impl Into<String>) -> Self {
        Self {
            first_name: None,
            last_name: Some(name.into()),
        }
    }

    /// Does `patient` pass this filter? Empty values match everything.
    pub fn matches(&self, patient: &Patient) -> bool {
        fn part(want: &Option<String>, have: &str) -> bool {
            match want.as_deref() {
                None | Some("") => true,
                Some(w) => w == have,
            }
        }
        part(&self.first_name, &patient.first_name) && part(&self.last_name, &patient.last_name)
    }
}

/// Source of the signed-in user id that namespaces all storage.
pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Fixed identity, or none at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity(pub Option<String>);

impl StaticIdentity {
    pub fn user(id: impl Into<String>) -> Self {
        Self(Some(id.into()))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.0.clone().filter(|id| !id.is_empty())
    }
}

/// Patient record store.
pub trait RecordStore {
    /// Receive the full matching list now and after every change.
    fn subscribe_patients(&self, filter: PatientFilter, on_change: Callback<Vec<Patient>>)
        -> Subscription;

    fn get_patient(&self, id: &str) -> Option<Patient>;

    /// Create a record. Returns its id, or `""` on failure.
    fn create_patient(&self, patient: &Patient) -> String;

    /// Replace a record. Returns `id`, or `""` on failure.
    fn update_patient(&self, id: &str, patient: &Patient) -> String;
}

/// Append-only settings store.
pub trait SettingsStore {
    /// Receive the latest snapshot now (if one exists) and after every append.
    fn subscribe_settings(&self, on_change: Callback<AppSettings>) -> Subscription;

    /// Append a snapshot. Returns false on failure.
    fn append_settings(&self, settings: &AppSettings) -> bool;
}
