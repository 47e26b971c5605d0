//! SQLite schema definition.

/// Complete database schema for the local record and settings store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients (partitioned per user)
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    user_id TEXT NOT NULL,
    id TEXT NOT NULL,
    first_name TEXT NOT NULL,                    -- copied from payload for filters
    last_name TEXT NOT NULL,                     -- copied from payload for filters
    is_seed INTEGER NOT NULL DEFAULT 0,
    payload TEXT NOT NULL,                       -- JSON Patient
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (user_id, id)
);

CREATE INDEX IF NOT EXISTS idx_patients_names ON patients(user_id, last_name, first_name);
CREATE INDEX IF NOT EXISTS idx_patients_seed ON patients(user_id, is_seed);

-- ============================================================================
-- Settings snapshots (append-only, latest by timestamp is active)
-- ============================================================================

CREATE TABLE IF NOT EXISTS settings (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    timestamp TEXT NOT NULL,                     -- RFC 3339, fixed width, UTC
    payload TEXT NOT NULL                        -- JSON AppSettings
);

CREATE INDEX IF NOT EXISTS idx_settings_user_ts ON settings(user_id, timestamp);

-- Settings rows are never rewritten
CREATE TRIGGER IF NOT EXISTS settings_no_update BEFORE UPDATE ON settings
BEGIN
    SELECT RAISE(ABORT, 'Settings snapshots are append-only');
END;
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_settings_append_only() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO settings (user_id, timestamp, payload) VALUES ('u1', '2024-01-01T00:00:00.000000Z', '{}')",
            [],
        )
        .unwrap();

        let result = conn.execute("UPDATE settings SET payload = '[]' WHERE user_id = 'u1'", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_patient_key_is_per_user() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let insert = "INSERT INTO patients (user_id, id, first_name, last_name, payload) VALUES (?, 'p1', 'A', 'B', '{}')";
        assert!(conn.execute(insert, ["u1"]).is_ok());
        assert!(conn.execute(insert, ["u2"]).is_ok());
        assert!(conn.execute(insert, ["u1"]).is_err());
    }
}
