//! Per-key async mutual exclusion
//!
//! Merges for the same user name must not interleave their lookup and write.
//! `KeyedLocks` hands out one `tokio::sync::Mutex` per key and drops the entry
//! once the last holder or waiter is gone, so the map only holds keys that
//! are in use.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;

type LockMap = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

#[derive(Clone, Default)]
pub struct KeyedLocks {
    inner: Arc<Mutex<LockMap>>,
}

/// Held lock for one key; releases on drop
pub struct KeyGuard {
    key: String,
    locks: Arc<Mutex<LockMap>>,
    _guard: OwnedMutexGuard<()>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no one else holds `key`, then hold it
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let mutex = {
            let mut map = lock_map(&self.inner);
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };

        let guard = mutex.lock_owned().await;

        KeyGuard {
            key: key.to_string(),
            locks: self.inner.clone(),
            _guard: guard,
        }
    }

    /// Number of keys currently held or awaited
    #[cfg(test)]
    pub fn active_keys(&self) -> usize {
        lock_map(&self.inner).len()
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        let mut map = lock_map(&self.locks);
        // Map entry plus our own guard: nobody else is waiting
        let idle = map
            .get(&self.key)
            .map(|mutex| Arc::strong_count(mutex) <= 2)
            .unwrap_or(false);
        if idle {
            map.remove(&self.key);
        }
    }
}

fn lock_map(inner: &Mutex<LockMap>) -> MutexGuard<'_, LockMap> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
