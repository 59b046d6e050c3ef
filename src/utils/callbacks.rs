//! Idempotent callback registry.
//!
//! Registering the same `Arc` twice is a no-op. `fire` yields once before
//! invoking, so callbacks never run inside the caller's current step.

use std::sync::{Arc, Mutex, MutexGuard};

pub type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
pub struct CallbackList {
    callbacks: Arc<Mutex<Vec<Callback>>>,
}

impl CallbackList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Returns `false` if it was already registered.
    pub fn add(&self, callback: Callback) -> bool {
        let mut callbacks = self.lock();
        if callbacks.iter().any(|c| Arc::ptr_eq(c, &callback)) {
            return false;
        }
        callbacks.push(callback);
        true
    }

    /// Unregister a callback. Returns `false` if it was not registered.
    pub fn remove(&self, callback: &Callback) -> bool {
        let mut callbacks = self.lock();
        let before = callbacks.len();
        callbacks.retain(|c| !Arc::ptr_eq(c, callback));
        callbacks.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Invoke every registered callback in registration order.
    pub async fn fire(&self) {
        tokio::task::yield_now().await;
        let snapshot: Vec<Callback> = self.lock().clone();
        for callback in snapshot {
            callback();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Callback>> {
        match self.callbacks.lock() {
            Ok(callbacks) => callbacks,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
#[path = "callbacks_test.rs"]
mod tests;
