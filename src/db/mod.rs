//! SQLite-backed structured-value store.
//!
//! One row per storage key; values are kept as JSON text and handed out as
//! `serde_json::Value`. Each write is a single `INSERT OR REPLACE`, so
//! concurrent writers in other processes race per key only.

use crate::error::{ConfigError, StoreResult};
use crate::storage::{Capabilities, ValueStore};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;

        // Enable WAL mode for concurrent access
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ConfigError::database("connection lock poisoned"))
    }

    fn run_migrations(&self) -> StoreResult<()> {
        let mut conn = self.lock()?;
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }
}

impl ValueStore for Database {
    fn capabilities(&self) -> Capabilities {
        if self.conn.is_poisoned() {
            Capabilities::none()
        } else {
            Capabilities::all()
        }
    }

    fn get_value(&self, key: &str) -> StoreResult<Option<Value>> {
        let text: Option<String> = self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT value FROM config_values WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?)
        })?;
        match text {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| ConfigError::from(e).with_key(key)),
            None => Ok(None),
        }
    }

    fn set_value(&self, key: &str, value: &Value) -> StoreResult<()> {
        let text = serde_json::to_string(value)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO config_values (key, value, updated_at)
                 VALUES (?1, ?2, strftime('%s', 'now'))",
                params![key, text],
            )?;
            Ok(())
        })
    }

    fn delete_value(&self, key: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM config_values WHERE key = ?1", params![key])?;
            Ok(())
        })
    }

    fn list_values(&self) -> StoreResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM config_values ORDER BY key")?;
            let keys = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(keys)
        })
    }
}
