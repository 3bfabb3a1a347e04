use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::storage::StorageMedium;

const SCHEMA_VERSION: i32 = 1;

/// SQLite-backed key/value medium. One row per key.
pub struct SqliteMedium {
    conn: Mutex<Connection>,
}

impl SqliteMedium {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open database")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(SqliteMedium {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    let version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap_or(0);

    if version < SCHEMA_VERSION {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;

        conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;
    }

    Ok(())
}

impl StorageMedium for SqliteMedium {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn().execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn setup_test_db() -> (SqliteMedium, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = SqliteMedium::open(&db_path).unwrap();
        (db, dir)
    }

    // ==================== Unit Tests ====================

    #[test]
    fn test_get_missing_key() {
        let (db, _dir) = setup_test_db();
        assert_eq!(db.get("nope").unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let (db, _dir) = setup_test_db();
        db.set("app_tickets", "[]").unwrap();
        assert_eq!(db.get("app_tickets").unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn test_set_overwrites() {
        let (db, _dir) = setup_test_db();
        db.set("k", "1").unwrap();
        db.set("k", "2").unwrap();
        assert_eq!(db.get("k").unwrap(), Some("2".to_string()));
        assert_eq!(db.keys().unwrap(), vec!["k".to_string()]);
    }

    #[test]
    fn test_remove() {
        let (db, _dir) = setup_test_db();
        db.set("k", "1").unwrap();
        db.remove("k").unwrap();
        assert_eq!(db.get("k").unwrap(), None);
        // Removing again is fine
        db.remove("k").unwrap();
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        {
            let db = SqliteMedium::open(&db_path).unwrap();
            db.set("app_session", r#"{"email":"a@x.com","id":"1"}"#).unwrap();
        }
        let db = SqliteMedium::open(&db_path).unwrap();
        assert_eq!(
            db.get("app_session").unwrap(),
            Some(r#"{"email":"a@x.com","id":"1"}"#.to_string())
        );
    }

    #[test]
    fn test_keys_sorted() {
        let db = SqliteMedium::open_in_memory().unwrap();
        db.set("b", "1").unwrap();
        db.set("a", "1").unwrap();
        assert_eq!(db.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_sql_injection_in_key() {
        let (db, _dir) = setup_test_db();
        let malicious = "'; DROP TABLE kv; --";
        db.set(malicious, "x").unwrap();
        assert_eq!(db.get(malicious).unwrap(), Some("x".to_string()));
        db.set("other", "y").unwrap();
        assert_eq!(db.keys().unwrap().len(), 2);
    }

    // ==================== Property-Based Tests ====================

    proptest! {
        #[test]
        fn prop_value_roundtrip(key in "[a-z_]{1,20}", value in "\\PC{0,200}") {
            let db = SqliteMedium::open_in_memory().unwrap();
            db.set(&key, &value).unwrap();
            prop_assert_eq!(db.get(&key).unwrap(), Some(value));
        }
    }
}
