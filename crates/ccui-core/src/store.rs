//! Observable state container
//!
//! Explicit store with subscribe/notify, standing in for the reactive
//! context/hook layer of the original UI so the chat core and its tests
//! stay framework-independent. Listeners run synchronously on the mutating
//! call, matching the single-threaded event-loop model of this core.

use parking_lot::Mutex;

/// Handle returned by [`Store::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Listener<T> = Box<dyn Fn(&T) + Send>;

/// A value plus a set of change listeners
pub struct Store<T> {
    value: Mutex<T>,
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
    next_id: Mutex<u64>,
}

impl<T: Clone> Store<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: Mutex::new(initial),
            listeners: Mutex::new(Vec::new()),
            next_id: Mutex::new(0),
        }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.value.lock().clone()
    }

    /// Register a listener invoked after every change
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + 'static) -> SubscriptionId {
        let mut next_id = self.next_id.lock();
        let id = *next_id;
        *next_id += 1;
        self.listeners.lock().push((id, Box::new(listener)));
        SubscriptionId(id)
    }

    /// Remove a previously registered listener
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.lock().retain(|(lid, _)| *lid != id.0);
    }

    /// Replace the value and notify listeners
    pub fn set(&self, value: T) {
        self.update(|v| *v = value);
    }

    /// Mutate the value in place and notify listeners
    ///
    /// The value lock is released before listeners run, so a listener may
    /// call [`Store::get`] without deadlocking.
    pub fn update(&self, mutate: impl FnOnce(&mut T)) {
        let snapshot = {
            let mut value = self.value.lock();
            mutate(&mut value);
            value.clone()
        };
        for (_, listener) in self.listeners.lock().iter() {
            listener(&snapshot);
        }
    }
}
