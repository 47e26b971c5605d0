//! SQLite persistence for patient records and settings snapshots.

mod schema;
mod patients;
mod settings;

pub use schema::*;
#[allow(unused_imports)]
pub use patients::*;
#[allow(unused_imports)]
pub use settings::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Connection to the local store. One file holds every user's records;
/// rows are partitioned by `user_id`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> DbResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Run `f` in a transaction. Committed if `f` succeeds, rolled back
    /// otherwise.
    pub fn in_transaction<R>(&self, f: impl FnOnce(&Database) -> DbResult<R>) -> DbResult<R> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"patients".to_string()));
        assert!(tables.contains(&"settings".to_string()));
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic.db");
        {
            let db = Database::open(&path).unwrap();
            db.insert_patient("u1", &crate::models::Patient::new("Ada", "Lovelace"))
                .unwrap();
        }
        let db = Database::open(&path).unwrap();
        let patients = db.list_patients("u1", &Default::default()).unwrap();
        assert_eq!(patients.len(), 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let result: DbResult<()> = db.in_transaction(|db| {
            db.insert_patient("u1", &crate::models::Patient::new("Ada", "Lovelace"))?;
            Err(serde_json::from_str::<i32>("forced").unwrap_err().into())
        });
        assert!(result.is_err());
        assert!(db.list_patients("u1", &Default::default()).unwrap().is_empty());

        let ids = db
            .in_transaction(|db| {
                let a = db.insert_patient("u1", &crate::models::Patient::new("A", "One"))?;
                let b = db.insert_patient("u1", &crate::models::Patient::new("B", "Two"))?;
                Ok(vec![a, b])
            })
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(db.list_patients("u1", &Default::default()).unwrap().len(), 2);
    }
}
