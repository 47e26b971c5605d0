//! Flattened, string-only patient projection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel shown for missing or unset values.
pub const MISSING: &str = "-";

/// Keys of the fixed part of a flattened patient.
pub mod keys {
    pub const ID: &str = "id";
    pub const FIRST_NAME: &str = "first_name";
    pub const MIDDLE_NAME: &str = "middle_name";
    pub const LAST_NAME: &str = "last_name";
    pub const SEX: &str = "sex";
    pub const GENDER: &str = "gender";
    pub const PHONE: &str = "phone";
    pub const NOTES: &str = "notes";
    pub const STATUS: &str = "status";
    pub const DOB: &str = "dob";
    pub const ADDRESS: &str = "address";
    pub const STREET: &str = "street";
    pub const CITY: &str = "city";
    pub const STATE: &str = "state";
    pub const ZIP: &str = "zip";
    pub const TIMESTAMP: &str = "timestamp";
    pub const IS_SEED: &str = "is_seed";
}

/// A patient as display-ready text, keyed by field name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct FlatStringPatient {
    values: BTreeMap<String, String>,
}

impl FlatStringPatient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key`, or `""` when the row has no such key.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.values().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Row id (`""` if absent).
    pub fn id(&self) -> &str {
        self.get_or_empty(keys::ID)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatStringPatient {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_empty() {
        let row: FlatStringPatient = [("id", "1"), ("last_name", "B")].into_iter().collect();
        assert_eq!(row.get_or_empty("last_name"), "B");
        assert_eq!(row.get_or_empty("city"), "");
        assert_eq!(row.get("city"), None);
        assert_eq!(row.id(), "1");
    }
}
