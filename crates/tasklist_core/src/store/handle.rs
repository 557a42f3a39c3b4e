//! Lazily opened, shareable store handle.
//!
//! The first successful `initialize` opens the database and starts the
//! writer; every later call returns the same store without touching disk.
//! A failed open is not cached, so the host may decide to try again.

use super::{SqliteTaskStore, StoreResult};
use log::info;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct StoreHandle {
    path: PathBuf,
    store: OnceCell<Arc<SqliteTaskStore>>,
}

impl StoreHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            store: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the store on first use; afterwards a no-op returning the same store.
    pub fn initialize(&self) -> StoreResult<Arc<SqliteTaskStore>> {
        if let Some(store) = self.store.get() {
            info!("event=store_init module=store status=skip reason=already_initialized");
            return Ok(Arc::clone(store));
        }
        let store = self
            .store
            .get_or_try_init(|| SqliteTaskStore::open(&self.path).map(Arc::new))?;
        Ok(Arc::clone(store))
    }
}
