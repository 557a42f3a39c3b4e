//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and the normalized seed item.
//! - Provide the listing comparator shared by all store implementations.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `created_at` and `remote_id` never change after creation.
//! - Seed-imported tasks sort ahead of local tasks, ascending by `remote_id`;
//!   local tasks follow, newest first.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for every stored task.
pub type TaskId = Uuid;

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Generated at creation, primary key.
    pub id: TaskId,
    /// Identifier from the remote seed list. `None` for locally created tasks.
    pub remote_id: Option<i64>,
    /// User-visible short label.
    pub title: String,
    /// Free text, may be empty.
    pub description: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub is_completed: bool,
}

impl Task {
    /// Creates a local task with a generated ID and `created_at = now`.
    pub fn new_local(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            remote_id: None,
            title: title.into(),
            description: description.into(),
            created_at: now_epoch_ms(),
            is_completed: false,
        }
    }

    /// Creates a task from one normalized seed item.
    ///
    /// The description starts empty and completion is copied from the source.
    pub fn from_seed(seed: &SeedTask) -> Self {
        Self {
            id: Uuid::new_v4(),
            remote_id: Some(seed.remote_id),
            title: seed.title.clone(),
            description: String::new(),
            created_at: now_epoch_ms(),
            is_completed: seed.completed,
        }
    }

    /// Whether this task came from the seed import.
    pub fn is_imported(&self) -> bool {
        self.remote_id.is_some()
    }

    /// Case-insensitive substring match over title and description.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

/// Remote list item normalized into the local schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTask {
    pub remote_id: i64,
    pub title: String,
    pub completed: bool,
}

/// Compares two tasks by listing order.
///
/// Imported tasks come first by ascending `remote_id`; local tasks follow by
/// descending `created_at`. Equal keys compare as `Equal`, so callers that need
/// a total order must sort a sequence whose ties are already arranged.
pub fn listing_order(a: &Task, b: &Task) -> Ordering {
    match (a.remote_id, b.remote_id) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.created_at.cmp(&a.created_at),
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
