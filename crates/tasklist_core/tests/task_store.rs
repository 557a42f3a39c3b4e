mod common;

use common::await_completion;
use std::sync::{Arc, Mutex};
use std::thread;
use tasklist_core::{
    Completion, ForegroundQueue, InMemoryTaskStore, SeedTask, SqliteTaskStore, StoreResult, Task,
    TaskId, TaskStore,
};
use tempfile::TempDir;
use uuid::Uuid;

struct Fixture {
    store: Arc<dyn TaskStore>,
    queue: Arc<ForegroundQueue>,
    _dir: Option<TempDir>,
}

fn sqlite_fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteTaskStore::open(dir.path().join("tasks.db")).unwrap();
    Fixture {
        store: Arc::new(store),
        queue: ForegroundQueue::new(),
        _dir: Some(dir),
    }
}

fn memory_fixture() -> Fixture {
    Fixture {
        store: Arc::new(InMemoryTaskStore::new()),
        queue: ForegroundQueue::new(),
        _dir: None,
    }
}

fn both() -> [(&'static str, Fixture); 2] {
    [("sqlite", sqlite_fixture()), ("memory", memory_fixture())]
}

impl Fixture {
    fn create(&self, title: &str, description: &str) -> Task {
        let (title, description) = (title.to_string(), description.to_string());
        await_completion(&self.queue, |done| self.store.create(title, description, done))
            .expect("create should succeed")
    }

    fn update(&self, id: TaskId, title: &str, description: &str) -> bool {
        let (title, description) = (title.to_string(), description.to_string());
        await_completion(&self.queue, |done| {
            self.store.update(id, title, description, done)
        })
    }

    fn delete(&self, id: TaskId) -> bool {
        await_completion(&self.queue, |done| self.store.delete(id, done))
    }

    fn toggle(&self, id: TaskId) -> Option<Task> {
        await_completion(&self.queue, |done| self.store.toggle_completion(id, done))
    }

    fn import(&self, items: Vec<SeedTask>) -> StoreResult<usize> {
        await_completion(&self.queue, |done| self.store.import_seed(items, done))
    }
}

fn seed(remote_id: i64, title: &str, completed: bool) -> SeedTask {
    SeedTask {
        remote_id,
        title: title.to_string(),
        completed,
    }
}

#[test]
fn create_then_fetch_returns_one_local_task() {
    for (name, fx) in both() {
        let created = fx.create("T", "D");

        let tasks = fx.store.fetch_all();
        assert_eq!(tasks.len(), 1, "{name}");
        assert_eq!(tasks[0], created, "{name}");
        assert_eq!(tasks[0].title, "T", "{name}");
        assert_eq!(tasks[0].description, "D", "{name}");
        assert!(!tasks[0].is_completed, "{name}");
        assert_eq!(tasks[0].remote_id, None, "{name}");
    }
}

#[test]
fn update_changes_only_title_and_description() {
    for (name, fx) in both() {
        let created = fx.create("Old Title", "Old Desc");
        let toggled = fx.toggle(created.id).unwrap();
        assert!(toggled.is_completed);

        assert!(fx.update(created.id, "New Title", "New Desc"), "{name}");

        let tasks = fx.store.fetch_all();
        assert_eq!(tasks.len(), 1, "{name}");
        let updated = &tasks[0];
        assert_eq!(updated.id, created.id, "{name}");
        assert_eq!(updated.created_at, created.created_at, "{name}");
        assert_eq!(updated.remote_id, None, "{name}");
        assert!(updated.is_completed, "{name}");
        assert_eq!(updated.title, "New Title", "{name}");
        assert_eq!(updated.description, "New Desc", "{name}");
    }
}

#[test]
fn update_of_imported_task_keeps_remote_identity() {
    for (name, fx) in both() {
        assert_eq!(fx.import(vec![seed(7, "seeded", true)]).unwrap(), 1, "{name}");
        let imported = fx.store.fetch_all().remove(0);

        assert!(fx.update(imported.id, "Renamed", "Now with notes"), "{name}");

        let updated = fx.store.fetch_all().remove(0);
        assert_eq!(updated.id, imported.id, "{name}");
        assert_eq!(updated.remote_id, Some(7), "{name}");
        assert_eq!(updated.created_at, imported.created_at, "{name}");
        assert!(updated.is_completed, "{name}");
        assert_eq!(updated.title, "Renamed", "{name}");
        assert_eq!(updated.description, "Now with notes", "{name}");
    }
}

#[test]
fn delete_removes_exactly_one_task() {
    for (name, fx) in both() {
        let keep = fx.create("keep", "");
        let drop_me = fx.create("drop", "");

        assert!(fx.delete(drop_me.id), "{name}");

        let tasks = fx.store.fetch_all();
        assert_eq!(tasks.len(), 1, "{name}");
        assert_eq!(tasks[0].id, keep.id, "{name}");

        assert!(fx.delete(keep.id), "{name}");
        assert!(fx.store.fetch_all().is_empty(), "{name}");
    }
}

#[test]
fn toggle_twice_restores_completion_state() {
    for (name, fx) in both() {
        let created = fx.create("T", "");

        let first = fx.toggle(created.id).unwrap();
        assert!(first.is_completed, "{name}");
        let second = fx.toggle(created.id).unwrap();
        assert!(!second.is_completed, "{name}");
        assert_eq!(second, created, "{name}");
    }
}

#[test]
fn missing_ids_are_silent_no_ops_that_still_complete() {
    for (name, fx) in both() {
        let existing = fx.create("T", "D");
        let missing = Uuid::new_v4();

        assert!(!fx.update(missing, "x", "y"), "{name}");
        assert!(!fx.delete(missing), "{name}");
        assert_eq!(fx.toggle(missing), None, "{name}");

        assert_eq!(fx.store.fetch_all(), vec![existing], "{name}");
    }
}

#[test]
fn imported_tasks_sort_first_by_remote_id() {
    for (name, fx) in both() {
        let local = fx.create("local", "");
        let count = fx
            .import(vec![seed(3, "three", false), seed(1, "one", true)])
            .unwrap();
        assert_eq!(count, 2, "{name}");

        let tasks = fx.store.fetch_all();
        let order: Vec<Option<i64>> = tasks.iter().map(|task| task.remote_id).collect();
        assert_eq!(order, vec![Some(1), Some(3), None], "{name}");
        assert_eq!(tasks[2].id, local.id, "{name}");

        assert!(tasks[0].is_completed, "{name}");
        assert!(tasks[0].description.is_empty(), "{name}");
        assert!(!tasks[1].is_completed, "{name}");
    }
}

#[test]
fn local_tasks_list_newest_first() {
    for (name, fx) in both() {
        let first = fx.create("first", "");
        let second = fx.create("second", "");
        let third = fx.create("third", "");

        let ids: Vec<TaskId> = fx.store.fetch_all().iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id], "{name}");
    }
}

#[test]
fn failed_writes_still_complete_and_change_nothing() {
    let store = Arc::new(InMemoryTaskStore::new());
    let queue = ForegroundQueue::new();
    store.set_fail_writes(true);

    let created = await_completion(&queue, |done| {
        store.create("T".to_string(), String::new(), done)
    });
    assert_eq!(created, None);

    let imported = await_completion(&queue, |done| {
        store.import_seed(vec![seed(1, "one", false)], done)
    });
    assert!(imported.is_err());

    assert!(store.fetch_all().is_empty());
    assert_eq!(store.committed_writes(), 0);
}

#[test]
fn completions_resume_on_the_draining_thread() {
    let fx = sqlite_fixture();
    let drain_thread = thread::current().id();

    let resumed_on = await_completion(&fx.queue, |done| {
        fx.store.create(
            "T".to_string(),
            String::new(),
            Completion::new(done.context(), move |_task| {
                done.complete(thread::current().id());
            }),
        )
    });
    assert_eq!(resumed_on, drain_thread);
}

#[test]
fn concurrent_writers_complete_with_their_own_content() {
    let fx = sqlite_fixture();
    let store = Arc::clone(&fx.store);
    let queue = Arc::clone(&fx.queue);
    let created = Arc::new(Mutex::new(Vec::new()));

    let writers: Vec<_> = (0..4)
        .map(|writer| {
            let store = Arc::clone(&store);
            let queue = Arc::clone(&queue);
            let created = Arc::clone(&created);
            thread::spawn(move || {
                for n in 0..10 {
                    let created = Arc::clone(&created);
                    store.create(
                        format!("w{writer}-{n}"),
                        format!("body of w{writer}-{n}"),
                        Completion::new(queue.clone(), move |task: Option<Task>| {
                            created.lock().unwrap().push(task);
                        }),
                    );
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert!(queue.run_until(common::TIMEOUT, || created.lock().unwrap().len() == 40));
    let reported: Vec<Task> = created
        .lock()
        .unwrap()
        .drain(..)
        .map(|task| task.expect("every create should succeed"))
        .collect();

    let stored = store.fetch_all();
    assert_eq!(stored.len(), 40);
    for task in &stored {
        assert_eq!(task.description, format!("body of {}", task.title));
    }
    let mut reported_ids: Vec<TaskId> = reported.iter().map(|task| task.id).collect();
    let mut stored_ids: Vec<TaskId> = stored.iter().map(|task| task.id).collect();
    reported_ids.sort();
    stored_ids.sort();
    assert_eq!(reported_ids, stored_ids);
}

#[test]
fn sqlite_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    let queue = ForegroundQueue::new();

    let created = {
        let store = SqliteTaskStore::open(&path).unwrap();
        await_completion(&queue, |done| {
            store.create("persist".to_string(), "me".to_string(), done)
        })
        .unwrap()
    };

    let reopened = SqliteTaskStore::open(&path).unwrap();
    assert_eq!(reopened.fetch_all(), vec![created]);
}
