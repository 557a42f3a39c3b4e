//! Explicit observer lists for change notifications.
//!
//! # Responsibility
//! - Carry store-level change events from writers to interested projections.
//! - Replace name-keyed broadcast with typed, owned subscriber lists.
//!
//! # Invariants
//! - Listeners are invoked in subscription order.
//! - A listener may subscribe or unsubscribe from inside a callback; the
//!   change applies to the next emission.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Store-level change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    /// The one-time seed import committed. Emitted once per installation.
    InitialDataLoaded,
    /// Any create, update, delete or import committed.
    TaskListChanged,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync + 'static>;

/// Ordered list of listeners for one event type.
pub struct Observers<E> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener<E>)>>,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl<E> Observers<E> {
    pub fn subscribe(&self, listener: impl Fn(&E) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, Arc::new(listener)));
        }
        id
    }

    /// Returns whether the subscription was still registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut listeners) = self.listeners.lock() else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in snapshot {
            listener(event);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.listeners.lock().map_or(0, |listeners| listeners.len())
    }
}

/// Shared, cloneable notifier for [`TaskEvent`]s.
///
/// Writers emit from the foreground context, so listeners run there too.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    observers: Arc<Observers<TaskEvent>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&TaskEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn emit(&self, event: TaskEvent) {
        self.observers.emit(&event);
    }
}
