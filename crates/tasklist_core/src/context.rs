//! Execution contexts for asynchronous completions.
//!
//! # Responsibility
//! - Let callers state explicitly where a completion resumes.
//! - Provide a foreground queue drained by the owning thread, and an
//!   immediate context for hosts that do not need thread affinity.
//!
//! # Invariants
//! - A `Completion` runs its callback at most once, always through its
//!   context.
//! - Jobs posted to a `ForegroundQueue` run in FIFO order on whichever thread
//!   drains the queue.

use log::warn;
use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Unit of work posted to an execution context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A place where completion callbacks run.
pub trait ExecutionContext: Send + Sync {
    fn execute(&self, job: Job);
}

/// Runs every job synchronously on the thread that posts it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateContext;

impl ExecutionContext for ImmediateContext {
    fn execute(&self, job: Job) {
        job();
    }
}

/// FIFO job queue owned by the foreground thread.
///
/// Background workers post into it; the foreground thread drains it with
/// [`ForegroundQueue::run_pending`] or [`ForegroundQueue::run_next`].
pub struct ForegroundQueue {
    sender: Sender<Job>,
    receiver: Mutex<Receiver<Job>>,
}

impl ForegroundQueue {
    pub fn new() -> Arc<Self> {
        let (sender, receiver) = mpsc::channel();
        Arc::new(Self {
            sender,
            receiver: Mutex::new(receiver),
        })
    }

    /// Runs every job currently queued without waiting. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Some(job) = self.try_take() {
            job();
            ran += 1;
        }
        ran
    }

    /// Waits up to `timeout` for one job and runs it.
    ///
    /// Returns `false` when nothing arrived in time.
    pub fn run_next(&self, timeout: Duration) -> bool {
        let job = {
            let Ok(receiver) = self.receiver.lock() else {
                return false;
            };
            match receiver.recv_timeout(timeout) {
                Ok(job) => job,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return false,
            }
        };
        job();
        true
    }

    /// Runs jobs as they arrive until `done` reports true or `timeout` elapses.
    ///
    /// Returns whether `done` was satisfied.
    pub fn run_until(&self, timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if done() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !self.run_next(remaining) {
                return done();
            }
        }
    }

    fn try_take(&self) -> Option<Job> {
        let receiver = self.receiver.lock().ok()?;
        receiver.try_recv().ok()
    }
}

impl ExecutionContext for ForegroundQueue {
    fn execute(&self, job: Job) {
        if self.sender.send(job).is_err() {
            warn!("event=context_post module=context status=error error_code=queue_closed");
        }
    }
}

/// One-shot callback bound to the context it must resume on.
pub struct Completion<T> {
    context: Arc<dyn ExecutionContext>,
    callback: Box<dyn FnOnce(T) + Send + 'static>,
}

impl<T: Send + 'static> Completion<T> {
    /// Binds `callback` to `context`.
    pub fn new(
        context: Arc<dyn ExecutionContext>,
        callback: impl FnOnce(T) + Send + 'static,
    ) -> Self {
        Self {
            context,
            callback: Box::new(callback),
        }
    }

    /// A completion that drops its value. Resumes immediately.
    pub fn ignore() -> Self {
        Self::new(Arc::new(ImmediateContext), |_| {})
    }

    /// Context this completion resumes on.
    pub fn context(&self) -> Arc<dyn ExecutionContext> {
        Arc::clone(&self.context)
    }

    /// Posts the callback with `value` to the bound context.
    pub fn complete(self, value: T) {
        let Self { context, callback } = self;
        context.execute(Box::new(move || callback(value)));
    }

    /// Runs the callback on the current thread.
    ///
    /// Only valid when the caller already runs on this completion's context,
    /// e.g. when chaining from another completion bound to the same context.
    pub(crate) fn resume_here(self, value: T) {
        (self.callback)(value);
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{Completion, ExecutionContext, ForegroundQueue};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn foreground_queue_runs_jobs_in_post_order() {
        let queue = ForegroundQueue::new();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        for value in 0..3 {
            let seen = Arc::clone(&seen);
            queue.execute(Box::new(move || seen.lock().unwrap().push(value)));
        }

        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(queue.run_pending(), 0);
    }

    #[test]
    fn completion_from_worker_thread_resumes_on_draining_thread() {
        let queue = ForegroundQueue::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let drain_thread = thread::current().id();

        let hits_in_callback = Arc::clone(&hits);
        let completion = Completion::new(queue.clone(), move |value: usize| {
            assert_eq!(thread::current().id(), drain_thread);
            hits_in_callback.fetch_add(value, Ordering::SeqCst);
        });
        thread::spawn(move || completion.complete(5)).join().unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(queue.run_next(Duration::from_secs(1)));
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn run_next_times_out_when_idle() {
        let queue = ForegroundQueue::new();
        assert!(!queue.run_next(Duration::from_millis(10)));
    }
}
