//! Patient database operations.

use chrono::{NaiveTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::{DateOfBirth, Patient};
use crate::store::PatientFilter;

/// Prepare a patient for storage: dates picked in a form become stored
/// timestamps (midnight UTC).
fn to_stored(patient: &Patient) -> Patient {
    let mut stored = patient.clone();
    if let Some(DateOfBirth::Date(date)) = stored.dob {
        stored.dob = Some(DateOfBirth::Timestamp(date.and_time(NaiveTime::MIN).and_utc()));
    }
    stored
}

impl Database {
    /// Insert a new patient for `user_id`. Assigns the id and creation
    /// timestamp; returns the id.
    pub fn insert_patient(&self, user_id: &str, patient: &Patient) -> DbResult<String> {
        let mut stored = to_stored(patient);
        stored.id = uuid::Uuid::new_v4().to_string();
        stored.timestamp = Some(Utc::now());
        let payload = serde_json::to_string(&stored)?;

        self.conn.execute(
            r#"
            INSERT INTO patients (user_id, id, first_name, last_name, is_seed, payload)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                user_id,
                stored.id,
                stored.first_name,
                stored.last_name,
                stored.is_seed,
                payload,
            ],
        )?;
        Ok(stored.id)
    }

    /// Replace an existing patient. Returns false if no such record exists.
    pub fn update_patient(&self, user_id: &str, id: &str, patient: &Patient) -> DbResult<bool> {
        let mut stored = to_stored(patient);
        stored.id = id.to_string();
        if stored.timestamp.is_none() {
            stored.timestamp = self.get_patient(user_id, id)?.and_then(|p| p.timestamp);
        }
        let payload = serde_json::to_string(&stored)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                first_name = ?3,
                last_name = ?4,
                is_seed = ?5,
                payload = ?6,
                updated_at = datetime('now')
            WHERE user_id = ?1 AND id = ?2
            "#,
            params![
                user_id,
                id,
                stored.first_name,
                stored.last_name,
                stored.is_seed,
                payload,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by id.
    pub fn get_patient(&self, user_id: &str, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                "SELECT id, payload FROM patients WHERE user_id = ? AND id = ?",
                [user_id, id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?
            .map(|(id, payload)| patient_from_row(id, &payload))
            .transpose()
    }

    /// List patients matching `filter` (exact, conjunctive on names), in
    /// creation order. Empty filter values are ignored.
    pub fn list_patients(&self, user_id: &str, filter: &PatientFilter) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, payload
            FROM patients
            WHERE user_id = ?1
              AND (?2 IS NULL OR first_name = ?2)
              AND (?3 IS NULL OR last_name = ?3)
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map(
            params![
                user_id,
                filter.first_name.as_deref().filter(|s| !s.is_empty()),
                filter.last_name.as_deref().filter(|s| !s.is_empty()),
            ],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )?;

        let mut patients = Vec::new();
        for row in rows {
            let (id, payload) = row?;
            match patient_from_row(id, &payload) {
                Ok(patient) => patients.push(patient),
                Err(e) => log::warn!("skipping unreadable patient row: {}", e),
            }
        }
        Ok(patients)
    }

    /// Delete every seeded patient of a user. Returns the number deleted.
    pub fn delete_seed_patients(&self, user_id: &str) -> DbResult<usize> {
        let rows_affected = self.conn.execute(
            "DELETE FROM patients WHERE user_id = ? AND is_seed = 1",
            [user_id],
        )?;
        Ok(rows_affected)
    }
}

fn patient_from_row(id: String, payload: &str) -> DbResult<Patient> {
    let mut patient: Patient = serde_json::from_str(payload)?;
    patient.id = id;
    Ok(patient)
}
