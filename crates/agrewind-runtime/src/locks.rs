use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// A lazily created mutex per key.
///
/// [`KeyedLocks::with_lock`] runs a closure under the key's mutex. An entry
/// lives only while some caller holds or waits on it.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = acquire(&self.locks);
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Run `f` while holding the mutex for `key`.
    pub fn with_lock<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let handle = self.handle(key);
        let result = {
            let _guard = acquire(&handle);
            f()
        };
        drop(handle);
        self.release(key);
        result
    }

    // Only the map's own clone left means nobody holds or waits on the key.
    fn release(&self, key: &str) {
        let mut locks = acquire(&self.locks);
        if locks
            .get(key)
            .is_some_and(|handle| Arc::strong_count(handle) == 1)
        {
            locks.remove(key);
        }
    }

    pub fn len(&self) -> usize {
        acquire(&self.locks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lock a mutex, recovering the guard if a previous holder panicked.
pub fn acquire<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
