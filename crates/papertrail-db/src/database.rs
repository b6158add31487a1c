//! SQLite connection management.

use crate::error::{DbError, Result};
use crate::schema;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Main database handle. The connection sits behind a mutex so every
/// write goes through a single writer.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: String,
}

impl Database {
    /// Open or create a database file at the specified path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let path_str = path.to_string_lossy().to_string();
        info!(path = %path_str, "SQLite database opened");

        Ok(Self { conn: Arc::new(Mutex::new(conn)), path: path_str })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)), path: ":memory:".to_string() })
    }

    /// Get the database path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Create tables and indexes if they don't exist.
    pub fn initialize(&self) -> Result<()> {
        self.lock()?.execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }
}
