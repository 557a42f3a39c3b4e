//! One-time seed import.
//!
//! # Responsibility
//! - Fetch the remote seed list and import it exactly once per installation.
//! - Announce the import through the change notifier.
//!
//! # Invariants
//! - Nothing is fetched or written when the import flag is already set.
//! - The flag is read only while this run holds the in-flight claim.
//! - The flag is set only after the import has committed.
//! - At most one fetch is outstanding at a time.

use crate::context::Completion;
use crate::events::{ChangeNotifier, TaskEvent};
use crate::remote::seed_source::{FetchError, SeedSource};
use crate::store::{ImportFlag, StoreError, TaskStore};
use log::{error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const FETCH_THREAD_NAME: &str = "tasklist-seed-fetch";

/// Result of one bootstrap run.
#[derive(Debug)]
pub enum BootstrapOutcome {
    /// Flag was set; nothing fetched or written.
    AlreadyImported,
    /// Another run is still in flight.
    InProgress,
    /// Seed list committed with this many tasks.
    Imported(usize),
    /// Seed list committed, but the flag could not be written. Unless the
    /// store records the flag with the import, the next run imports again.
    ImportedFlagUnset { count: usize, error: StoreError },
    /// Fetch failed; the flag stays unset so the next launch retries.
    FetchFailed(FetchError),
    /// Store rejected the import; the flag stays unset.
    StoreFailed(StoreError),
}

/// Wires a seed source, a store and the persisted flag together.
pub struct SeedBootstrap {
    source: Arc<dyn SeedSource>,
    store: Arc<dyn TaskStore>,
    flag: Arc<dyn ImportFlag>,
    notifier: ChangeNotifier,
    in_flight: Arc<AtomicBool>,
}

impl SeedBootstrap {
    pub fn new(
        source: Arc<dyn SeedSource>,
        store: Arc<dyn TaskStore>,
        flag: Arc<dyn ImportFlag>,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            source,
            store,
            flag,
            notifier,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs the import if it has not happened yet.
    ///
    /// The fetch runs on a background thread; `done`, `InitialDataLoaded` and
    /// `TaskListChanged` are delivered on `done`'s context.
    pub fn run(&self, done: Completion<BootstrapOutcome>) {
        // Claim first: a flag read before the claim may predate another
        // run's commit. Runs clear the claim only after setting the flag.
        if self.in_flight.swap(true, Ordering::SeqCst) {
            info!("event=seed_bootstrap module=service status=skip reason=in_progress");
            done.complete(BootstrapOutcome::InProgress);
            return;
        }
        if self.flag.is_set() {
            self.in_flight.store(false, Ordering::SeqCst);
            info!("event=seed_bootstrap module=service status=skip reason=already_imported");
            done.complete(BootstrapOutcome::AlreadyImported);
            return;
        }

        info!("event=seed_bootstrap module=service status=start");
        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        let flag = Arc::clone(&self.flag);
        let notifier = self.notifier.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let context = done.context();

        // The job owns `done`; a failed spawn hands it back through the slot.
        let slot = Arc::new(std::sync::Mutex::new(Some(done)));
        let job_slot = Arc::clone(&slot);
        let job_in_flight = Arc::clone(&in_flight);
        let spawned = thread::Builder::new()
            .name(FETCH_THREAD_NAME.to_string())
            .spawn(move || {
                let Some(done) = job_slot.lock().ok().and_then(|mut slot| slot.take()) else {
                    return;
                };
                let items = match source.fetch_seed_tasks() {
                    Ok(items) => items,
                    Err(err) => {
                        job_in_flight.store(false, Ordering::SeqCst);
                        done.complete(BootstrapOutcome::FetchFailed(err));
                        return;
                    }
                };

                store.import_seed(
                    items,
                    Completion::new(context, move |result| {
                        let outcome = match result {
                            Ok(count) => {
                                let flag_result = flag.mark_set();
                                notifier.emit(TaskEvent::InitialDataLoaded);
                                notifier.emit(TaskEvent::TaskListChanged);
                                match flag_result {
                                    Ok(()) => {
                                        info!("event=seed_bootstrap module=service status=ok count={count}");
                                        BootstrapOutcome::Imported(count)
                                    }
                                    Err(error) => {
                                        error!(
                                            "event=seed_bootstrap module=service status=error error_code=flag_write_failed count={count} error={error}"
                                        );
                                        BootstrapOutcome::ImportedFlagUnset { count, error }
                                    }
                                }
                            }
                            Err(err) => BootstrapOutcome::StoreFailed(err),
                        };
                        job_in_flight.store(false, Ordering::SeqCst);
                        done.resume_here(outcome);
                    }),
                );
            });

        if let Err(err) = spawned {
            error!("event=seed_bootstrap module=service status=error error_code=spawn_failed error={err}");
            in_flight.store(false, Ordering::SeqCst);
            let pending = slot.lock().ok().and_then(|mut slot| slot.take());
            if let Some(done) = pending {
                done.complete(BootstrapOutcome::StoreFailed(StoreError::WorkerSpawn(err)));
            }
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}
