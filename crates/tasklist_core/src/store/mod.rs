//! Asynchronous task persistence.
//!
//! # Responsibility
//! - Define the `TaskStore` capability shared by the SQLite engine and the
//!   in-memory double.
//! - Report every mutation through a `Completion` bound to the caller's
//!   execution context.
//!
//! # Invariants
//! - Every mutation fires its completion exactly once, also on failure.
//! - Not-found and I/O failures are logged, never surfaced as panics.
//! - `fetch_all` never fails: on error it logs and returns an empty list.

use crate::context::Completion;
use crate::db::DbError;
use crate::model::task::{SeedTask, Task, TaskId};
use crate::repo::task_repo::RepoError;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod flag;
mod handle;
mod memory;
mod sqlite;

pub use flag::{ImportFlag, MemoryImportFlag, SqliteImportFlag};
pub use handle::StoreHandle;
pub use memory::InMemoryTaskStore;
pub use sqlite::SqliteTaskStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error reported to completions and bootstrap callers.
#[derive(Debug)]
pub enum StoreError {
    Repo(RepoError),
    /// The background writer could not be started.
    WorkerSpawn(std::io::Error),
    /// The background writer is gone; the write never ran.
    WorkerStopped,
    /// A simulated failure from the in-memory store.
    Unavailable,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::WorkerSpawn(err) => write!(f, "failed to start store writer: {err}"),
            Self::WorkerStopped => write!(f, "store writer is not running"),
            Self::Unavailable => write!(f, "store is unavailable"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::WorkerSpawn(err) => Some(err),
            Self::WorkerStopped | Self::Unavailable => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Durable task storage addressed by `TaskId`.
///
/// Implementations serialize writes: two mutations never interleave at the
/// storage layer. Completions resume on the context they were built with.
pub trait TaskStore: Send + Sync {
    /// All tasks in listing order.
    fn fetch_all(&self) -> Vec<Task>;

    /// Creates a local task. Resolves to the stored task, or `None` on failure.
    fn create(&self, title: String, description: String, done: Completion<Option<Task>>);

    /// Overwrites title and description. Resolves to whether a row changed.
    fn update(&self, id: TaskId, title: String, description: String, done: Completion<bool>);

    /// Removes a task. Resolves to whether a row was removed.
    fn delete(&self, id: TaskId, done: Completion<bool>);

    /// Flips `is_completed`. Resolves to the updated task, or `None` when
    /// `id` is unknown or the write failed.
    fn toggle_completion(&self, id: TaskId, done: Completion<Option<Task>>);

    /// Creates one task per seed item in a single atomic write.
    ///
    /// Resolves to the number of created tasks or the failure, so callers can
    /// leave the import flag unset.
    fn import_seed(&self, items: Vec<SeedTask>, done: Completion<StoreResult<usize>>);
}

/// Logs a finished mutation and folds it into an optional value.
///
/// Not-found is a skipped no-op; anything else is an error.
pub(crate) fn settle<T>(op: &'static str, id: Option<TaskId>, result: StoreResult<T>) -> Option<T> {
    let id_label = id.map_or_else(|| "-".to_string(), |id| id.to_string());
    match result {
        Ok(value) => {
            info!("event={op} module=store status=ok task_id={id_label}");
            Some(value)
        }
        Err(StoreError::Repo(RepoError::NotFound(missing))) => {
            warn!("event={op} module=store status=skip error_code=not_found task_id={missing}");
            None
        }
        Err(err) => {
            error!("event={op} module=store status=error task_id={id_label} error={err}");
            None
        }
    }
}

/// Logs a finished seed import.
pub(crate) fn log_import(result: &StoreResult<usize>) {
    match result {
        Ok(count) => info!("event=seed_import module=store status=ok count={count}"),
        Err(err) => error!("event=seed_import module=store status=error error={err}"),
    }
}
