//! In-memory task store used as a test double and by embedders without disk.
//!
//! Mutations apply synchronously under a lock and then resolve their
//! completion, so the single-writer and atomic-commit guarantees hold
//! trivially.

use super::{log_import, settle, StoreError, StoreResult, TaskStore};
use crate::context::Completion;
use crate::model::task::{listing_order, SeedTask, Task, TaskId};
use crate::repo::task_repo::RepoError;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    /// Insertion order.
    tasks: Vec<Task>,
    committed_writes: usize,
    fail_writes: bool,
}

/// Lock-guarded vector of tasks implementing [`TaskStore`].
#[derive(Default)]
pub struct InMemoryTaskStore {
    state: Mutex<MemoryState>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutations that changed stored state.
    pub fn committed_writes(&self) -> usize {
        self.lock().committed_writes
    }

    /// Makes every following mutation fail as if the commit hit an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-write; the vector
        // itself is still consistent because mutations are single statements.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write<T>(&self, apply: impl FnOnce(&mut Vec<Task>) -> StoreResult<T>) -> StoreResult<T> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(StoreError::Unavailable);
        }
        let value = apply(&mut state.tasks)?;
        state.committed_writes += 1;
        Ok(value)
    }
}

fn position(tasks: &[Task], id: TaskId) -> StoreResult<usize> {
    tasks
        .iter()
        .position(|task| task.id == id)
        .ok_or(StoreError::Repo(RepoError::NotFound(id)))
}

impl TaskStore for InMemoryTaskStore {
    fn fetch_all(&self) -> Vec<Task> {
        // Newest insertion first, so the stable sort breaks created_at ties
        // the same way the SQLite engine does.
        let mut tasks: Vec<Task> = self.lock().tasks.iter().rev().cloned().collect();
        tasks.sort_by(listing_order);
        tasks
    }

    fn create(&self, title: String, description: String, done: Completion<Option<Task>>) {
        let task = Task::new_local(title, description);
        let id = task.id;
        let result = self.write(|tasks| {
            tasks.push(task.clone());
            Ok(task)
        });
        done.complete(settle("task_create", Some(id), result));
    }

    fn update(&self, id: TaskId, title: String, description: String, done: Completion<bool>) {
        let result = self.write(|tasks| {
            let index = position(tasks, id)?;
            tasks[index].title = title;
            tasks[index].description = description;
            Ok(())
        });
        done.complete(settle("task_update", Some(id), result).is_some());
    }

    fn delete(&self, id: TaskId, done: Completion<bool>) {
        let result = self.write(|tasks| {
            let index = position(tasks, id)?;
            tasks.remove(index);
            Ok(())
        });
        done.complete(settle("task_delete", Some(id), result).is_some());
    }

    fn toggle_completion(&self, id: TaskId, done: Completion<Option<Task>>) {
        let result = self.write(|tasks| {
            let index = position(tasks, id)?;
            tasks[index].is_completed = !tasks[index].is_completed;
            Ok(tasks[index].clone())
        });
        done.complete(settle("task_toggle", Some(id), result));
    }

    fn import_seed(&self, items: Vec<SeedTask>, done: Completion<StoreResult<usize>>) {
        let result = self.write(|tasks| {
            tasks.extend(items.iter().map(Task::from_seed));
            Ok(items.len())
        });
        log_import(&result);
        done.complete(result);
    }
}
