//! Database handle and schema
//!
//! Schema is created idempotently on open; there is no separate migration
//! step.

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Database {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (and create if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.create_schema()?;
        Ok(db)
    }

    /// In-memory database for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.create_schema()?;
        Ok(db)
    }

    fn create_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS accounts (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id      INTEGER NOT NULL,
                name         TEXT NOT NULL DEFAULT '',
                phone        TEXT NOT NULL UNIQUE,
                api_id       INTEGER NOT NULL,
                api_hash     TEXT NOT NULL,
                session_path TEXT NOT NULL,
                is_connected INTEGER NOT NULL DEFAULT 0,
                is_started   INTEGER NOT NULL DEFAULT 0,
                folder_id    INTEGER,
                batch_size   INTEGER NOT NULL DEFAULT 10,
                created_at   TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS folders (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name    TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS texts (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL,
                category   TEXT NOT NULL,
                body       TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS recipients (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL,
                username   TEXT NOT NULL,
                item_name  TEXT NOT NULL DEFAULT '',
                sent       INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS jobs (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL,
                name       TEXT NOT NULL,
                created_at TEXT NOT NULL,
                answer     TEXT
            );",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_and_reopens() {
        let db = Database::open_in_memory().unwrap();
        // Second schema pass on the same handle must be a no-op.
        db.create_schema().unwrap();
    }
}
