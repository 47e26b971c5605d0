//! SQLite-backed local store with in-process realtime listeners.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{
    Callback, IdentityProvider, Listeners, PatientFilter, RecordStore, SettingsStore,
    StaticIdentity, Subscription,
};
use crate::db::{Database, DbResult};
use crate::models::{AppSettings, Patient};

/// Local record and settings store, partitioned per user.
///
/// Every successful write re-publishes full snapshots to the affected
/// user's listeners.
pub struct LocalStore<I = StaticIdentity> {
    db: Mutex<Database>,
    identity: I,
    patient_listeners: Listeners<(String, PatientFilter), Vec<Patient>>,
    settings_listeners: Listeners<String, AppSettings>,
}

impl<I: IdentityProvider> LocalStore<I> {
    pub fn new(db: Database, identity: I) -> Self {
        Self {
            db: Mutex::new(db),
            identity,
            patient_listeners: Listeners::new(),
            settings_listeners: Listeners::new(),
        }
    }

    /// Open or create a store database at `path`.
    pub fn open<P: AsRef<Path>>(path: P, identity: I) -> DbResult<Self> {
        Ok(Self::new(Database::open(path)?, identity))
    }

    /// In-memory store (for testing).
    pub fn open_in_memory(identity: I) -> DbResult<Self> {
        Ok(Self::new(Database::open_in_memory()?, identity))
    }

    /// The signed-in user, if any.
    pub fn user_id(&self) -> Option<String> {
        self.identity.current_user_id()
    }

    fn require_user(&self, op: &str) -> Option<String> {
        let user = self.user_id();
        if user.is_none() {
            log::warn!("{}: no signed-in user, skipping", op);
        }
        user
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the database for the signed-in user.
    fn with_db<R>(
        &self,
        op: &str,
        f: impl FnOnce(&Database, &str) -> DbResult<R>,
    ) -> Option<R> {
        let user = self.require_user(op)?;
        let db = self.db();
        match f(&db, &user) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("{} failed: {}", op, e);
                None
            }
        }
    }

    /// One-shot read of the patients matching `filter`.
    pub fn list_patients(&self, filter: &PatientFilter) -> Vec<Patient> {
        self.with_db("list_patients", |db, user| db.list_patients(user, filter))
            .unwrap_or_default()
    }

    /// The latest settings snapshot, if one was ever appended.
    pub fn latest_settings(&self) -> Option<AppSettings> {
        self.with_db("latest_settings", |db, user| db.latest_settings(user))
            .flatten()
    }

    /// Insert every patient as seed data. Returns the ids created.
    pub fn create_seed_data(&self, patients: Vec<Patient>) -> Vec<String> {
        let ids = self
            .with_db("create_seed_data", |db, user| {
                db.in_transaction(|db| {
                    patients
                        .into_iter()
                        .map(|mut patient| {
                            patient.is_seed = true;
                            db.insert_patient(user, &patient)
                        })
                        .collect::<DbResult<Vec<_>>>()
                })
            })
            .unwrap_or_default();
        if let Some(user) = self.user_id() {
            self.publish_patients(&user);
        }
        ids
    }

    /// Delete seeded records only. Returns how many were removed.
    pub fn delete_seed_data(&self) -> usize {
        let removed = self
            .with_db("delete_seed_data", |db, user| db.delete_seed_patients(user))
            .unwrap_or(0);
        if removed > 0 {
            if let Some(user) = self.user_id() {
                self.publish_patients(&user);
            }
        }
        removed
    }

    fn publish_patients(&self, user: &str) {
        let listeners = self.patient_listeners.matching(|(u, _)| u == user);
        if listeners.is_empty() {
            return;
        }
        let all = {
            let db = self.db();
            match db.list_patients(user, &PatientFilter::default()) {
                Ok(all) => all,
                Err(e) => {
                    log::error!("publish patients failed: {}", e);
                    return;
                }
            }
        };
        for ((_, filter), callback) in listeners {
            let matching = all.iter().filter(|p| filter.matches(p)).cloned().collect();
            callback(matching);
        }
    }

    fn publish_settings(&self, user: &str) {
        let listeners = self.settings_listeners.matching(|u| u == user);
        if listeners.is_empty() {
            return;
        }
        let latest = {
            let db = self.db();
            match db.latest_settings(user) {
                Ok(Some(latest)) => latest,
                Ok(None) => return,
                Err(e) => {
                    log::error!("publish settings failed: {}", e);
                    return;
                }
            }
        };
        for (_, callback) in listeners {
            callback(latest.clone());
        }
    }
}

impl<I: IdentityProvider> RecordStore for LocalStore<I> {
    fn subscribe_patients(
        &self,
        filter: PatientFilter,
        on_change: Callback<Vec<Patient>>,
    ) -> Subscription {
        let Some(user) = self.require_user("subscribe_patients") else {
            return Subscription::inert();
        };
        let initial = self.list_patients(&filter);
        let subscription = self.patient_listeners.add((user, filter), on_change.clone());
        on_change(initial);
        subscription
    }

    fn get_patient(&self, id: &str) -> Option<Patient> {
        self.with_db("get_patient", |db, user| db.get_patient(user, id))
            .flatten()
    }

    fn create_patient(&self, patient: &Patient) -> String {
        match self.with_db("create_patient", |db, user| db.insert_patient(user, patient)) {
            Some(id) => {
                if let Some(user) = self.user_id() {
                    self.publish_patients(&user);
                }
                id
            }
            None => String::new(),
        }
    }

    fn update_patient(&self, id: &str, patient: &Patient) -> String {
        match self.with_db("update_patient", |db, user| db.update_patient(user, id, patient)) {
            Some(true) => {
                if let Some(user) = self.user_id() {
                    self.publish_patients(&user);
                }
                id.to_string()
            }
            Some(false) => {
                log::error!("update_patient failed: no patient {}", id);
                String::new()
            }
            None => String::new(),
        }
    }
}

impl<I: IdentityProvider> SettingsStore for LocalStore<I> {
    fn subscribe_settings(&self, on_change: Callback<AppSettings>) -> Subscription {
        let Some(user) = self.require_user("subscribe_settings") else {
            return Subscription::inert();
        };
        let initial = self.latest_settings();
        let subscription = self.settings_listeners.add(user, on_change.clone());
        if let Some(settings) = initial {
            on_change(settings);
        }
        subscription
    }

    fn append_settings(&self, settings: &AppSettings) -> bool {
        let appended = self
            .with_db("append_settings", |db, user| db.append_settings(user, settings))
            .is_some();
        if appended {
            if let Some(user) = self.user_id() {
                self.publish_settings(&user);
            }
        }
        appended
    }
}
