//! Database layer for shunt records.

mod records;
mod schema;

#[allow(unused_imports)]
pub use records::*;
pub use schema::*;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::StorageConfig;

/// Default wait for a competing writer before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),

    #[error("Storage directory unavailable: {0}")]
    StorageDirectory(#[from] std::io::Error),
}

impl DbError {
    /// True for failures of the durable medium rather than of the input.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(
            self,
            DbError::StorageUnavailable(_) | DbError::StorageDirectory(_)
        )
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Owned handle to the record store.
///
/// The schema is not applied on open; call [`Database::migrate`] once before
/// first use. The connection is released when the handle is dropped or
/// [`Database::close`] is called.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating the file if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open database at path with an explicit busy timeout.
    pub fn open_with_timeout<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> DbResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        info!(path = %path.display(), "Opened shunt record database");
        Ok(Self { conn })
    }

    /// Open the database described by configuration, creating its directory.
    pub fn open_configured(config: &StorageConfig) -> DbResult<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::open_with_timeout(
            &config.database_path,
            Duration::from_millis(config.busy_timeout_ms),
        )
    }

    /// Create in-memory database (for testing and simulation sessions).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply the schema. Safe to call on an already initialized database.
    pub fn migrate(&self) -> DbResult<()> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version >= SCHEMA_VERSION {
            debug!(version, "Schema up to date");
            return Ok(());
        }

        let tx = self.write_transaction()?;
        // another session may have migrated while we waited for the lock
        let version: i64 = tx.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version >= SCHEMA_VERSION {
            debug!(version, "Schema migrated by another session");
            return Ok(());
        }
        tx.execute_batch(SCHEMA)?;
        let relabeled = tx.execute(LEGACY_TAG_RELABEL, [])?;
        tx.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
        tx.commit()?;

        info!(from = version, to = SCHEMA_VERSION, relabeled, "Migrated schema");
        Ok(())
    }

    /// Begin a transaction that holds the write lock from the start.
    ///
    /// Competing sessions queue on the busy timeout. A deferred transaction
    /// that reads first fails at once with SQLITE_BUSY when its lock upgrade
    /// would deadlock.
    pub(crate) fn write_transaction(&self) -> DbResult<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    /// Current schema version.
    pub fn schema_version(&self) -> DbResult<i64> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, surfacing any error from SQLite.
    pub fn close(self) -> DbResult<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }
}
