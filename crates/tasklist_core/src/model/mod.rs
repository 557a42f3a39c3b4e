//! Domain model for the task list.
//!
//! # Responsibility
//! - Define the canonical task record shared by store, projection and edit
//!   flows.
//! - Own the listing order used by every store implementation.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - `remote_id` is only ever set by the one-time seed import.

pub mod task;
