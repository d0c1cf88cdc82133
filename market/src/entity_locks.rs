//! Per-entity lock registry.
//!
//! Operations on different entities can proceed concurrently; operations on
//! the same entity are serialized. Guards are owned, so they stay valid
//! across await points for the length of the operation.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A keyed registry of per-entity mutexes.
#[derive(Default)]
pub struct EntityLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the exclusive lock for one entity, creating it on first use.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of entities with a registered lock.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Drop locks no longer held by anyone.
    pub async fn cleanup(&self) {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
