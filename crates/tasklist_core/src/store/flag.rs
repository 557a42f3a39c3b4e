//! Persisted "seed import completed" flag.
//!
//! # Responsibility
//! - Expose the one process-wide boolean the bootstrap consults before
//!   fetching seed data.
//!
//! # Invariants
//! - The flag is only set after the seed import has committed.
//! - Read failures are treated as "not set" so the import is retried.

use super::{StoreError, StoreResult};
use crate::db::open_db;
use crate::repo::flag_repo::{read_flag, write_flag, SEED_IMPORTED_FLAG};
use log::error;
use rusqlite::Connection;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Persisted one-time import marker.
pub trait ImportFlag: Send + Sync {
    fn is_set(&self) -> bool;
    fn mark_set(&self) -> StoreResult<()>;
}

/// Flag stored as a row in the task database.
pub struct SqliteImportFlag {
    conn: Mutex<Connection>,
}

impl SqliteImportFlag {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl ImportFlag for SqliteImportFlag {
    fn is_set(&self) -> bool {
        let Ok(conn) = self.conn.lock() else {
            return false;
        };
        match read_flag(&conn, SEED_IMPORTED_FLAG) {
            Ok(value) => value,
            Err(err) => {
                error!("event=flag_read module=store status=error error={err}");
                false
            }
        }
    }

    fn mark_set(&self) -> StoreResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable)?;
        write_flag(&conn, SEED_IMPORTED_FLAG, true)?;
        Ok(())
    }
}

/// Process-local flag for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemoryImportFlag {
    value: AtomicBool,
}

impl MemoryImportFlag {
    pub fn new(initial: bool) -> Self {
        Self {
            value: AtomicBool::new(initial),
        }
    }
}

impl ImportFlag for MemoryImportFlag {
    fn is_set(&self) -> bool {
        self.value.load(Ordering::SeqCst)
    }

    fn mark_set(&self) -> StoreResult<()> {
        self.value.store(true, Ordering::SeqCst);
        Ok(())
    }
}
