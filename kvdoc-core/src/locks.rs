//! Keyed async locks serializing read-modify-write sequences.

use mea::mutex::Mutex;
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex as SyncMutex, PoisonError},
};

/// Number of entries after which idle locks are pruned.
const PRUNE_THRESHOLD: usize = 256;

/// Hands out one async mutex per key.
///
/// Holders keep the returned `Arc` alive for as long as they hold the lock;
/// entries nobody references are dropped once the table grows.
#[derive(Default)]
pub(crate) struct KeyedLocks {
    locks: SyncMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl fmt::Debug for KeyedLocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();

        f.debug_struct("KeyedLocks").field("keys", &len).finish()
    }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        if locks.len() >= PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }

        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
