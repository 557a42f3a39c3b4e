//! Edit session for a single task.
//!
//! # Responsibility
//! - Decide whether ending an edit creates, updates, deletes or discards.
//! - Provide display data for the edit screen.
//!
//! # Invariants
//! - A committed task never has an empty trimmed title: an empty title is
//!   derived from the description, and if that is empty too the task is
//!   deleted (existing) or never created (new).
//! - `initial_data` never mutates storage.

use crate::context::Completion;
use crate::events::{ChangeNotifier, TaskEvent};
use crate::model::task::{now_epoch_ms, Task, TaskId};
use crate::store::TaskStore;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use time::format_description;
use time::OffsetDateTime;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const DERIVED_TITLE_WORDS: usize = 2;
const CREATED_DATE_FORMAT: &str = "[day]/[month]/[year repr:last_two]";

/// What `commit` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Created(Task),
    Updated(TaskId),
    Deleted(TaskId),
    /// New task with nothing to save.
    Discarded,
    /// The store reported failure; nothing changed.
    Failed,
}

/// Display data for the edit screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialEditData {
    /// `None` asks the presentation to show its placeholder.
    pub title: Option<String>,
    pub description: Option<String>,
    /// Creation date as `dd/MM/yy`; today for a new task.
    pub created_date: String,
}

/// Edit session over one existing task, or a new one.
pub struct TaskEditModel {
    task: Option<Task>,
    title: String,
    description: String,
    store: Arc<dyn TaskStore>,
    notifier: ChangeNotifier,
}

impl TaskEditModel {
    /// Starts a session. Editing text starts from the task's stored fields.
    pub fn new(task: Option<Task>, store: Arc<dyn TaskStore>, notifier: ChangeNotifier) -> Self {
        let (title, description) = task
            .as_ref()
            .map(|task| (task.title.clone(), task.description.clone()))
            .unwrap_or_default();
        Self {
            task,
            title,
            description,
            store,
            notifier,
        }
    }

    pub fn is_edit_mode(&self) -> bool {
        self.task.is_some()
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    /// Records the current editor text.
    pub fn update(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.title = title.into();
        self.description = description.into();
    }

    /// Ends the edit: creates, updates, deletes or discards.
    ///
    /// `TaskListChanged` is emitted after a successful store write, before
    /// `done` runs, both on `done`'s context.
    pub fn commit(&self, done: Completion<EditOutcome>) {
        let description = self.description.trim().to_string();
        let title = derive_title(&self.title, &description);
        let context = done.context();
        let notifier = self.notifier.clone();

        match (&self.task, title.is_empty()) {
            (Some(task), true) => {
                let id = task.id;
                info!("event=edit_commit module=service action=delete task_id={id}");
                self.store.delete(
                    id,
                    Completion::new(context, move |removed| {
                        finish(&notifier, removed, done, EditOutcome::Deleted(id));
                    }),
                );
            }
            (Some(task), false) => {
                let id = task.id;
                info!("event=edit_commit module=service action=update task_id={id}");
                self.store.update(
                    id,
                    title,
                    description,
                    Completion::new(context, move |changed| {
                        finish(&notifier, changed, done, EditOutcome::Updated(id));
                    }),
                );
            }
            (None, false) => {
                info!("event=edit_commit module=service action=create");
                self.store.create(
                    title,
                    description,
                    Completion::new(context, move |created: Option<Task>| match created {
                        Some(task) => finish(&notifier, true, done, EditOutcome::Created(task)),
                        None => done.resume_here(EditOutcome::Failed),
                    }),
                );
            }
            (None, true) => {
                debug!("event=edit_commit module=service action=discard");
                done.complete(EditOutcome::Discarded);
            }
        }
    }

    /// Display data for the edit screen.
    ///
    /// A stored empty title falls back to the first words of the
    /// description, for display only.
    pub fn initial_data(&self) -> InitialEditData {
        let Some(task) = &self.task else {
            return InitialEditData {
                title: None,
                description: None,
                created_date: format_created_date(now_epoch_ms()),
            };
        };

        let title = if !task.title.is_empty() {
            Some(task.title.clone())
        } else if !task.description.is_empty() {
            Some(first_words(&task.description, DERIVED_TITLE_WORDS))
        } else {
            None
        };
        let description = (!task.description.is_empty()).then(|| task.description.clone());

        InitialEditData {
            title,
            description,
            created_date: format_created_date(task.created_at),
        }
    }
}

fn finish(
    notifier: &ChangeNotifier,
    applied: bool,
    done: Completion<EditOutcome>,
    outcome: EditOutcome,
) {
    if applied {
        notifier.emit(TaskEvent::TaskListChanged);
        done.resume_here(outcome);
    } else {
        done.resume_here(EditOutcome::Failed);
    }
}

/// Trimmed title, or the first two words of `description` when it is empty.
pub fn derive_title(title: &str, description: &str) -> String {
    let title = title.trim();
    if title.is_empty() && !description.trim().is_empty() {
        return first_words(description, DERIVED_TITLE_WORDS);
    }
    title.to_string()
}

/// First `max_count` whitespace-separated words, joined by one space.
pub fn first_words(text: &str, max_count: usize) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    WHITESPACE_RE
        .split(trimmed)
        .take(max_count)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats epoch milliseconds as `dd/MM/yy` in UTC.
///
/// Returns an empty string for timestamps outside the supported range.
pub fn format_created_date(epoch_ms: i64) -> String {
    let Ok(format) = format_description::parse(CREATED_DATE_FORMAT) else {
        return String::new();
    };
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(epoch_ms) * 1_000_000)
        .ok()
        .and_then(|datetime| datetime.format(&format).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{derive_title, first_words, format_created_date};

    #[test]
    fn derive_title_prefers_trimmed_title() {
        assert_eq!(derive_title("  Groceries ", "Buy milk today"), "Groceries");
    }

    #[test]
    fn derive_title_falls_back_to_two_description_words() {
        assert_eq!(derive_title("   ", "Buy milk today"), "Buy milk");
        assert_eq!(derive_title("", "  Buy \n\t milk  today "), "Buy milk");
        assert_eq!(derive_title("", "single"), "single");
    }

    #[test]
    fn derive_title_is_empty_when_both_fields_are_blank() {
        assert_eq!(derive_title(" ", " \n "), "");
    }

    #[test]
    fn first_words_collapses_whitespace_runs() {
        assert_eq!(first_words("a   b c", 2), "a b");
        assert_eq!(first_words("", 2), "");
    }

    #[test]
    fn created_date_uses_day_month_short_year() {
        // 2025-11-24T12:00:00Z
        assert_eq!(format_created_date(1_763_985_600_000), "24/11/25");
    }
}
