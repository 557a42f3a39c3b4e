//! SQLite-backed task store with a single background writer.
//!
//! # Responsibility
//! - Run every mutation on one writer thread that owns the write connection.
//! - Serve reads from a separate reader connection.
//!
//! # Invariants
//! - At most one write is in flight; writes run in submission order.
//! - Each logical write is one transaction, so readers never observe a
//!   partially written record.
//! - A write whose worker is gone still resolves its completion.
//! - `import_seed` sets the seed-imported flag in the import's own
//!   transaction, so the rows and the flag commit together.

use super::{log_import, settle, StoreError, StoreResult, TaskStore};
use crate::context::Completion;
use crate::db::open_db;
use crate::model::task::{SeedTask, Task, TaskId};
use crate::repo::flag_repo::{write_flag, SEED_IMPORTED_FLAG};
use crate::repo::task_repo::{RepoResult, SqliteTaskRepository, TaskRepository};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, SendError, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

const WRITER_THREAD_NAME: &str = "tasklist-writer";

/// `None` means the writer is gone and the job must fail without touching
/// storage.
type WriteJob = Box<dyn FnOnce(Option<&mut Connection>) + Send + 'static>;

struct WriteWorker {
    sender: Sender<WriteJob>,
    handle: JoinHandle<()>,
}

/// Production store over a SQLite database file.
pub struct SqliteTaskStore {
    reader: Mutex<Connection>,
    writer: Option<WriteWorker>,
}

impl SqliteTaskStore {
    /// Opens the database at `path`, applies migrations and starts the writer.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let write_conn = open_db(path)?;
        let reader = open_db(path)?;

        let (sender, receiver) = mpsc::channel::<WriteJob>();
        let handle = thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || run_writer(write_conn, receiver))
            .map_err(StoreError::WorkerSpawn)?;

        info!("event=store_open module=store status=ok");
        Ok(Self {
            reader: Mutex::new(reader),
            writer: Some(WriteWorker { sender, handle }),
        })
    }

    fn submit<T, W, F>(&self, work: W, finish: F)
    where
        T: Send + 'static,
        W: FnOnce(&Connection) -> RepoResult<T> + Send + 'static,
        F: FnOnce(StoreResult<T>) + Send + 'static,
    {
        let job: WriteJob = Box::new(move |conn: Option<&mut Connection>| {
            let result = match conn {
                Some(conn) => run_in_transaction(conn, work),
                None => Err(StoreError::WorkerStopped),
            };
            finish(result);
        });

        match &self.writer {
            Some(worker) => {
                if let Err(SendError(job)) = worker.sender.send(job) {
                    job(None);
                }
            }
            None => job(None),
        }
    }
}

impl TaskStore for SqliteTaskStore {
    fn fetch_all(&self) -> Vec<Task> {
        let Ok(conn) = self.reader.lock() else {
            error!("event=task_fetch module=store status=error error_code=reader_poisoned");
            return Vec::new();
        };

        match SqliteTaskRepository::new(&conn).list_tasks() {
            Ok(tasks) => tasks,
            Err(err) => {
                error!("event=task_fetch module=store status=error error={err}");
                Vec::new()
            }
        }
    }

    fn create(&self, title: String, description: String, done: Completion<Option<Task>>) {
        let task = Task::new_local(title, description);
        let id = task.id;
        self.submit(
            move |conn| {
                SqliteTaskRepository::new(conn).insert_task(&task)?;
                Ok(task)
            },
            move |result| done.complete(settle("task_create", Some(id), result)),
        );
    }

    fn update(&self, id: TaskId, title: String, description: String, done: Completion<bool>) {
        self.submit(
            move |conn| SqliteTaskRepository::new(conn).update_content(id, &title, &description),
            move |result| done.complete(settle("task_update", Some(id), result).is_some()),
        );
    }

    fn delete(&self, id: TaskId, done: Completion<bool>) {
        self.submit(
            move |conn| SqliteTaskRepository::new(conn).delete_task(id),
            move |result| done.complete(settle("task_delete", Some(id), result).is_some()),
        );
    }

    fn toggle_completion(&self, id: TaskId, done: Completion<Option<Task>>) {
        self.submit(
            move |conn| SqliteTaskRepository::new(conn).toggle_completion(id),
            move |result| done.complete(settle("task_toggle", Some(id), result)),
        );
    }

    fn import_seed(&self, items: Vec<SeedTask>, done: Completion<StoreResult<usize>>) {
        self.submit(
            move |conn| {
                let repo = SqliteTaskRepository::new(conn);
                for item in &items {
                    repo.insert_task(&Task::from_seed(item))?;
                }
                write_flag(conn, SEED_IMPORTED_FLAG, true)?;
                Ok(items.len())
            },
            move |result| {
                log_import(&result);
                done.complete(result);
            },
        );
    }
}

impl Drop for SqliteTaskStore {
    fn drop(&mut self) {
        let Some(WriteWorker { sender, handle }) = self.writer.take() else {
            return;
        };
        // Closing the channel lets the writer drain queued jobs and exit.
        drop(sender);
        if handle.thread().id() == thread::current().id() {
            // Dropped from a completion running on the writer itself.
            return;
        }
        if handle.join().is_err() {
            error!("event=store_close module=store status=error error_code=writer_panicked");
        }
    }
}

fn run_writer(mut conn: Connection, receiver: Receiver<WriteJob>) {
    while let Ok(job) = receiver.recv() {
        job(Some(&mut conn));
    }
    info!("event=store_close module=store status=ok");
}

fn run_in_transaction<T>(
    conn: &mut Connection,
    work: impl FnOnce(&Connection) -> RepoResult<T>,
) -> StoreResult<T> {
    let tx = conn.transaction()?;
    let value = work(&tx)?;
    tx.commit()?;
    Ok(value)
}
