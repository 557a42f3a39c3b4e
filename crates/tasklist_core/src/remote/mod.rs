//! Remote seed data.
//!
//! # Responsibility
//! - Fetch the fixed remote todo list once and normalize it into
//!   [`SeedTask`](crate::model::task::SeedTask) values.
//!
//! # Invariants
//! - No retries happen here; the bootstrap decides when to try again.

pub mod seed_source;
