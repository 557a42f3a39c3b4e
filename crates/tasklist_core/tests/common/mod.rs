#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tasklist_core::{Completion, ForegroundQueue};

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Starts an async call and drains the foreground queue until it resolves.
pub fn await_completion<T: Send + 'static>(
    queue: &Arc<ForegroundQueue>,
    start: impl FnOnce(Completion<T>),
) -> T {
    let slot = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&slot);
    start(Completion::new(queue.clone(), move |value| {
        *sink.lock().unwrap() = Some(value);
    }));

    let resolved = queue.run_until(TIMEOUT, || slot.lock().unwrap().is_some());
    assert!(resolved, "completion did not fire within {TIMEOUT:?}");
    let value = slot.lock().unwrap().take();
    value.unwrap()
}

/// Records every event passed to it.
#[derive(Clone)]
pub struct Recorder<E> {
    events: Arc<Mutex<Vec<E>>>,
}

impl<E> Default for Recorder<E> {
    fn default() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<E: Clone + Send + 'static> Recorder<E> {
    pub fn push(&self, event: E) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<E> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}
