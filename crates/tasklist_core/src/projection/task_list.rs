//! Task list projection: full list plus search subset.
//!
//! # Responsibility
//! - Rebuild the full list from the store on demand.
//! - Filter by a case-insensitive substring over title and description.
//! - Patch a toggled task in place instead of reloading.
//!
//! # Invariants
//! - `is_searching` is true exactly when a non-empty search term is set, even
//!   when it matches nothing.
//! - Observers run on the projection's context, after state is updated.

use super::count_label::CountLabelFormatter;
use crate::context::{Completion, ExecutionContext};
use crate::events::{ChangeNotifier, Observers, SubscriptionId, TaskEvent};
use crate::model::task::{Task, TaskId};
use crate::store::TaskStore;
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// What the presentation should redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionEvent {
    /// Reload every row.
    DataUpdated,
    /// Only the row for this task changed.
    TaskUpdated(TaskId),
}

#[derive(Debug, Default)]
struct ListState {
    all: Vec<Task>,
    filtered: Vec<Task>,
    search_term: Option<String>,
}

impl ListState {
    fn apply_filter(&mut self) {
        self.filtered = match &self.search_term {
            Some(term) => filter_tasks(&self.all, term),
            None => Vec::new(),
        };
    }

    fn is_searching(&self) -> bool {
        self.search_term.is_some()
    }

    fn visible(&self) -> &[Task] {
        if self.is_searching() {
            &self.filtered
        } else {
            &self.all
        }
    }
}

struct Inner {
    store: Arc<dyn TaskStore>,
    context: Arc<dyn ExecutionContext>,
    formatter: Box<dyn CountLabelFormatter>,
    state: Mutex<ListState>,
    observers: Observers<ProjectionEvent>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, ListState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn refresh(&self) {
        let tasks = self.store.fetch_all();
        {
            let mut state = self.state();
            state.all = tasks;
            state.apply_filter();
            debug!(
                "event=projection_refresh module=projection total={} filtered={}",
                state.all.len(),
                state.filtered.len()
            );
        }
        self.observers.emit(&ProjectionEvent::DataUpdated);
    }

    fn patch(&self, updated: Task) {
        let id = updated.id;
        {
            let mut state = self.state();
            let ListState { all, filtered, .. } = &mut *state;
            for list in [all, filtered] {
                if let Some(slot) = list.iter_mut().find(|task| task.id == id) {
                    *slot = updated.clone();
                }
            }
        }
        self.observers.emit(&ProjectionEvent::TaskUpdated(id));
    }
}

/// Shareable handle to the projection; clones observe the same state.
#[derive(Clone)]
pub struct TaskListProjection {
    inner: Arc<Inner>,
}

impl TaskListProjection {
    /// Creates an empty projection. Call [`reload`](Self::reload) to load.
    ///
    /// Store completions resume on `context`.
    pub fn new(
        store: Arc<dyn TaskStore>,
        context: Arc<dyn ExecutionContext>,
        formatter: Box<dyn CountLabelFormatter>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                context,
                formatter,
                state: Mutex::new(ListState::default()),
                observers: Observers::default(),
            }),
        }
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&ProjectionEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.observers.unsubscribe(id)
    }

    /// Refreshes on every store-level change announced by `notifier`.
    ///
    /// The subscription holds the projection weakly.
    pub fn watch(&self, notifier: &ChangeNotifier) -> SubscriptionId {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        notifier.subscribe(move |event| {
            if let Some(inner) = weak.upgrade() {
                debug!("event=projection_notified module=projection change={event:?}");
                match event {
                    TaskEvent::InitialDataLoaded | TaskEvent::TaskListChanged => inner.refresh(),
                }
            }
        })
    }

    /// Loads the full list and clears any search.
    pub fn reload(&self) {
        let tasks = self.inner.store.fetch_all();
        {
            let mut state = self.inner.state();
            state.all = tasks;
            state.search_term = None;
            state.filtered.clear();
        }
        self.inner.observers.emit(&ProjectionEvent::DataUpdated);
    }

    /// Re-fetches the full list and re-applies the active search.
    pub fn refresh(&self) {
        self.inner.refresh();
    }

    /// Filters the current full list. An empty term clears the search.
    pub fn search(&self, term: &str) {
        {
            let mut state = self.inner.state();
            state.search_term = (!term.is_empty()).then(|| term.to_string());
            state.apply_filter();
        }
        self.inner.observers.emit(&ProjectionEvent::DataUpdated);
    }

    pub fn clear_search(&self) {
        self.search("");
    }

    pub fn is_searching(&self) -> bool {
        self.inner.state().is_searching()
    }

    pub fn search_term(&self) -> Option<String> {
        self.inner.state().search_term.clone()
    }

    /// Toggles completion and patches the row in place.
    ///
    /// Emits `TaskUpdated(id)` on success; unknown IDs change nothing.
    pub fn toggle_completion(&self, id: TaskId) {
        let inner = Arc::clone(&self.inner);
        self.inner.store.toggle_completion(
            id,
            Completion::new(Arc::clone(&self.inner.context), move |updated| {
                if let Some(task) = updated {
                    inner.patch(task);
                }
            }),
        );
    }

    /// Deletes a task, then refreshes the whole list.
    pub fn delete(&self, id: TaskId) {
        let inner = Arc::clone(&self.inner);
        self.inner.store.delete(
            id,
            Completion::new(Arc::clone(&self.inner.context), move |_removed| {
                inner.refresh();
            }),
        );
    }

    pub fn all_tasks(&self) -> Vec<Task> {
        self.inner.state().all.clone()
    }

    pub fn filtered_tasks(&self) -> Vec<Task> {
        self.inner.state().filtered.clone()
    }

    /// Visible row count: the search subset while searching, else everything.
    pub fn count(&self) -> usize {
        self.inner.state().visible().len()
    }

    pub fn row_count(&self) -> usize {
        self.count()
    }

    pub fn task_at(&self, index: usize) -> Option<Task> {
        self.inner.state().visible().get(index).cloned()
    }

    pub fn count_label(&self) -> String {
        self.inner.formatter.label(self.count())
    }
}

fn filter_tasks(tasks: &[Task], term: &str) -> Vec<Task> {
    let needle = term.to_lowercase();
    tasks
        .iter()
        .filter(|task| task.matches_lowercase(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::filter_tasks;
    use crate::model::task::Task;

    #[test]
    fn filter_matches_title_or_description_ignoring_case() {
        let tasks = vec![
            Task::new_local("Buy milk", ""),
            Task::new_local("Clean", "wash car"),
        ];

        let hits = filter_tasks(&tasks, "CAR");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Clean");

        let hits = filter_tasks(&tasks, "mil");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Buy milk");
    }
}
