//! Settings snapshot database operations.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::AppSettings;

fn timestamp_column(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Database {
    /// Append a settings snapshot stamped with the current time. Returns the
    /// stamp.
    pub fn append_settings(&self, user_id: &str, settings: &AppSettings) -> DbResult<DateTime<Utc>> {
        let stamp = Utc::now();
        let snapshot = AppSettings {
            patient_data_settings: settings.patient_data_settings.clone(),
            timestamp: Some(stamp),
        };
        let payload = serde_json::to_string(&snapshot)?;

        self.conn.execute(
            "INSERT INTO settings (user_id, timestamp, payload) VALUES (?1, ?2, ?3)",
            params![user_id, timestamp_column(&stamp), payload],
        )?;
        Ok(stamp)
    }

    /// The most recent snapshot of a user, if any was ever appended.
    pub fn latest_settings(&self, user_id: &str) -> DbResult<Option<AppSettings>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                r#"
                SELECT payload FROM settings
                WHERE user_id = ?
                ORDER BY timestamp DESC, seq DESC
                LIMIT 1
                "#,
                [user_id],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|p| serde_json::from_str(&p).map_err(Into::into))
            .transpose()
    }

    #[cfg(test)]
    pub(crate) fn settings_history_len(&self, user_id: &str) -> DbResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM settings WHERE user_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
