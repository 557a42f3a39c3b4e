//! In-memory read models over the task store.
//!
//! # Responsibility
//! - Hold the full list and the search subset the presentation renders.
//! - Patch single rows in place and tell observers exactly what changed.
//!
//! # Invariants
//! - Both sequences keep store order.
//! - The search subset is always evaluated against the current full list.

pub mod count_label;
pub mod task_list;
