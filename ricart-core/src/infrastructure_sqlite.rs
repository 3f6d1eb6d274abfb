//! SQLite-backed ResourceStore implementation.
//! File contents survive process restarts.
//!
//! Enable with the `sqlite` feature flag:
//! ```toml
//! ricart-core = { path = "../ricart-core", features = ["sqlite"] }
//! ```

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::StoreError;
use crate::infrastructure::ResourceStore;
use crate::types::ResourceName;

/// A persistent resource store backed by SQLite.
///
/// Every write also appends to a JSON-encoded history column so the
/// sequence of critical-section writes can be audited.
#[derive(Clone)]
pub struct SqliteResourceStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteResourceStore {
    /// Open (or create) a SQLite database at the given path.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent read performance
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS resources (
                name     TEXT PRIMARY KEY,
                content  TEXT NOT NULL,
                history  TEXT NOT NULL DEFAULT '[]'
            );",
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Create or overwrite a resource outside the protocol (bootstrap only)
    pub fn insert(&self, name: &ResourceName, content: &str) -> Result<(), rusqlite::Error> {
        self.conn().execute(
            "INSERT OR REPLACE INTO resources (name, content, history) VALUES (?1, ?2, '[]')",
            params![name.as_str(), content],
        )?;
        Ok(())
    }

    /// Every content written through `write`, oldest first
    pub fn history(&self, name: &ResourceName) -> Result<Vec<String>, StoreError> {
        let raw: Option<String> = self
            .conn()
            .query_row(
                "SELECT history FROM resources WHERE name = ?1",
                params![name.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| sql_error(name, e))?;

        match raw {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::Io {
                name: name.clone(),
                message: e.to_string(),
            }),
            None => Err(StoreError::NotFound(name.clone())),
        }
    }
}

fn sql_error(name: &ResourceName, err: rusqlite::Error) -> StoreError {
    StoreError::Io {
        name: name.clone(),
        message: err.to_string(),
    }
}

impl ResourceStore for SqliteResourceStore {
    fn open(&self, name: &ResourceName) -> Result<String, StoreError> {
        self.read(name)
    }

    fn read(&self, name: &ResourceName) -> Result<String, StoreError> {
        self.conn()
            .query_row(
                "SELECT content FROM resources WHERE name = ?1",
                params![name.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| sql_error(name, e))?
            .ok_or_else(|| StoreError::NotFound(name.clone()))
    }

    fn write(&self, name: &ResourceName, content: &str) -> Result<(), StoreError> {
        let mut history = match self.history(name) {
            Ok(history) => history,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        history.push(content.to_string());
        let encoded = serde_json::to_string(&history).map_err(|e| StoreError::Io {
            name: name.clone(),
            message: e.to_string(),
        })?;

        self.conn()
            .execute(
                "INSERT INTO resources (name, content, history) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET content = excluded.content, history = excluded.history",
                params![name.as_str(), content, encoded],
            )
            .map_err(|e| sql_error(name, e))?;
        Ok(())
    }
}
