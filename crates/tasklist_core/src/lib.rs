//! Core domain logic for the task list.
//! This crate is the single source of truth for task invariants: storage,
//! the one-time seed import, edit decisions and the list projection.

pub mod config;
pub mod context;
pub mod db;
pub mod events;
pub mod logging;
pub mod model;
pub mod projection;
pub mod remote;
pub mod repo;
pub mod service;
pub mod store;

pub use config::CoreConfig;
pub use context::{Completion, ExecutionContext, ForegroundQueue, ImmediateContext};
pub use events::{ChangeNotifier, SubscriptionId, TaskEvent};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::task::{SeedTask, Task, TaskId};
pub use projection::count_label::{CountLabelFormatter, EnglishCountLabel, RussianCountLabel};
pub use projection::task_list::{ProjectionEvent, TaskListProjection};
pub use remote::seed_source::{FetchError, HttpSeedSource, SeedSource};
pub use repo::task_repo::{RepoError, RepoResult};
pub use service::edit_model::{EditOutcome, InitialEditData, TaskEditModel};
pub use service::seed_bootstrap::{BootstrapOutcome, SeedBootstrap};
pub use store::{
    ImportFlag, InMemoryTaskStore, MemoryImportFlag, SqliteImportFlag, SqliteTaskStore,
    StoreError, StoreHandle, StoreResult, TaskStore,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
