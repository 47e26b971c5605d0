//! Memoized flattening keyed by patient id and content fingerprint.

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};

use super::flatten;
use crate::models::{FlatStringPatient, Patient};

/// Content fingerprint of a patient: SHA-256 over its JSON form.
///
/// Records carry no modification stamp (`timestamp` is the creation time and
/// survives updates), so the content itself is the version. The JSON is
/// streamed into the hasher without an intermediate buffer.
pub fn patient_fingerprint(patient: &Patient) -> Option<String> {
    let mut hasher = Sha256::new();
    serde_json::to_writer(&mut hasher, patient).ok()?;
    Some(hex::encode(hasher.finalize()))
}

struct CachedRow {
    fingerprint: String,
    row: FlatStringPatient,
}

/// Cache of flattened rows. A row is reused while the patient's id and
/// fingerprint are unchanged.
#[derive(Default)]
pub struct FlattenCache {
    entries: HashMap<String, CachedRow>,
    hits: u64,
    misses: u64,
}

impl FlattenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten one patient, reusing a cached row when possible.
    /// Unpersisted patients (empty id) are never cached.
    pub fn flatten(&mut self, patient: &Patient) -> FlatStringPatient {
        if !patient.is_persisted() {
            return flatten(patient);
        }
        let Some(fingerprint) = patient_fingerprint(patient) else {
            return flatten(patient);
        };

        if let Some(cached) = self.entries.get(&patient.id) {
            if cached.fingerprint == fingerprint {
                self.hits += 1;
                return cached.row.clone();
            }
        }

        self.misses += 1;
        let row = flatten(patient);
        self.entries.insert(
            patient.id.clone(),
            CachedRow {
                fingerprint,
                row: row.clone(),
            },
        );
        row
    }

    /// Flatten a full snapshot and evict rows of patients no longer in it.
    pub fn flatten_snapshot(&mut self, patients: &[Patient]) -> Vec<FlatStringPatient> {
        let live: HashSet<&str> = patients.iter().map(|p| p.id.as_str()).collect();
        self.entries.retain(|id, _| live.contains(id.as_str()));
        patients.iter().map(|p| self.flatten(p)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(id: &str, last_name: &str) -> Patient {
        let mut patient = Patient::new("Test", last_name);
        patient.id = id.to_string();
        patient
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = stored("p1", "Smith");
        let mut b = a.clone();
        assert_eq!(patient_fingerprint(&a), patient_fingerprint(&b));

        b.phone = "555-0100".into();
        assert_ne!(patient_fingerprint(&a), patient_fingerprint(&b));
    }

    #[test]
    fn test_cache_hit_and_invalidation() {
        let mut cache = FlattenCache::new();
        let mut patient = stored("p1", "Smith");

        cache.flatten(&patient);
        cache.flatten(&patient);
        assert_eq!(cache.stats(), (1, 1));

        patient.last_name = "Jones".into();
        let row = cache.flatten(&patient);
        assert_eq!(row.get("last_name"), Some("Jones"));
        assert_eq!(cache.stats(), (1, 2));
    }

    #[test]
    fn test_edit_with_same_timestamp_invalidates() {
        let mut cache = FlattenCache::new();
        let mut patient = stored("p1", "Smith");
        patient.timestamp = Some(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
        cache.flatten(&patient);

        patient.custom.insert("allergies".into(), "none".into());
        let row = cache.flatten(&patient);
        assert_eq!(row.get("allergies"), Some("none"));
        assert_eq!(cache.stats(), (0, 2));
    }

    #[test]
    fn test_unpersisted_not_cached() {
        let mut cache = FlattenCache::new();
        cache.flatten(&Patient::new("New", "Patient"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_snapshot_evicts_removed() {
        let mut cache = FlattenCache::new();
        cache.flatten_snapshot(&[stored("p1", "A"), stored("p2", "B")]);
        assert_eq!(cache.len(), 2);

        let rows = cache.flatten_snapshot(&[stored("p2", "B")]);
        assert_eq!(rows.len(), 1);
        assert_eq!(cache.len(), 1);
    }
}
