//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define synchronous, connection-scoped data access contracts.
//! - Isolate SQLite query details from the async store and services.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Read paths reject invalid persisted rows instead of masking them.

pub mod flag_repo;
pub mod task_repo;
