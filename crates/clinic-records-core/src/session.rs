//! Application-shell settings holder.
//!
//! A [`Session`] owns the one live settings subscription and hands out
//! snapshots. Everything downstream takes the snapshot as an argument.

use std::sync::{Arc, Mutex, PoisonError};

use crate::models::AppSettings;
use crate::registry::{headers_for_table, keyed_by_field_name, KeyedDataFields};
use crate::store::{Callback, SettingsStore, Subscription};

pub struct Session {
    settings: Arc<Mutex<AppSettings>>,
    subscription: Subscription,
}

impl Session {
    /// Start following the settings of the signed-in user. Until the first
    /// snapshot arrives the built-in defaults are used.
    pub fn start<S: SettingsStore + ?Sized>(store: &S) -> Self {
        let settings = Arc::new(Mutex::new(AppSettings::default()));
        let target = Arc::clone(&settings);
        let on_change: Callback<AppSettings> = Arc::new(move |latest| {
            *target.lock().unwrap_or_else(PoisonError::into_inner) = latest;
        });
        let subscription = store.subscribe_settings(on_change);
        Self {
            settings,
            subscription,
        }
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> AppSettings {
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn keyed_fields(&self) -> KeyedDataFields {
        keyed_by_field_name(&self.settings().patient_data_settings)
    }

    pub fn table_headers(&self) -> Vec<String> {
        headers_for_table(&self.settings().patient_data_settings)
    }

    /// Whether the settings subscription is live.
    pub fn is_live(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop following settings. The last snapshot is returned.
    pub fn close(self) -> AppSettings {
        let settings = self.settings();
        self.subscription.unsubscribe();
        settings
    }
}
