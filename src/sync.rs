//! One-shot synchronization primitives.
//!
//! Background resource loading publishes its result through a [`OnceLatch`]:
//! the loader sets the value exactly once and any number of consumers block
//! until it is available. Waiting parks on a condition variable, never a
//! polling loop.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// A single-assignment cell that consumers can block on.
pub struct OnceLatch<T> {
    slot: Mutex<Option<Arc<T>>>,
    ready: Condvar,
}

impl<T> OnceLatch<T> {
    /// Create an empty latch.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Publish the value and wake every waiter. Only the first call takes
    /// effect; later values are dropped.
    pub fn set(&self, value: T) {
        let mut slot = self.slot.lock();
        if slot.is_none() {
            *slot = Some(Arc::new(value));
            self.ready.notify_all();
        }
    }

    /// Block until the value has been published.
    pub fn wait(&self) -> Arc<T> {
        let mut slot = self.slot.lock();
        loop {
            if let Some(value) = slot.as_ref() {
                return Arc::clone(value);
            }
            self.ready.wait(&mut slot);
        }
    }

    /// The value, if already published.
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.lock().as_ref().map(Arc::clone)
    }
}

impl<T> Default for OnceLatch<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_wait_blocks_until_set() {
        let latch = Arc::new(OnceLatch::new());
        let setter = Arc::clone(&latch);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            setter.set(42);
        });
        assert_eq!(*latch.wait(), 42);
    }

    #[test]
    fn test_first_set_wins() {
        let latch = OnceLatch::new();
        latch.set("first");
        latch.set("second");
        assert_eq!(*latch.wait(), "first");
    }

    #[test]
    fn test_get_before_set() {
        let latch: OnceLatch<u32> = OnceLatch::new();
        assert!(latch.get().is_none());
        latch.set(7);
        assert_eq!(latch.get().map(|v| *v), Some(7));
    }

    #[test]
    fn test_many_waiters() {
        let latch = Arc::new(OnceLatch::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let latch = Arc::clone(&latch);
            handles.push(thread::spawn(move || *latch.wait()));
        }
        latch.set(99u64);
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 99);
        }
    }
}
