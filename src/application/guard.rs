//! Per-pool exclusive sections.
//!
//! Every read-modify-write of a pool (scheduler transitions, ledger
//! reconciliation, administrative actions) runs while holding that pool's
//! guard. Different pools never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::id::PoolId;

type Locks = DashMap<PoolId, Arc<Mutex<()>>>;

#[derive(Clone, Default)]
pub struct PoolGuards {
    locks: Arc<Locks>,
}

impl PoolGuards {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `pool_id`.
    pub async fn lock(&self, pool_id: PoolId) -> PoolGuard {
        let mutex = Arc::clone(self.locks.entry(pool_id).or_default().value());
        let held = mutex.lock_owned().await;
        PoolGuard {
            held: Some(held),
            pool_id,
            locks: Arc::clone(&self.locks),
        }
    }

    /// Pools currently held or awaited. Idle pools are dropped from the map
    /// when their last guard is released.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one pool until dropped.
pub struct PoolGuard {
    held: Option<OwnedMutexGuard<()>>,
    pool_id: PoolId,
    locks: Arc<Locks>,
}

impl Drop for PoolGuard {
    fn drop(&mut self) {
        drop(self.held.take());
        // Only the map's own handle left: nobody holds or waits.
        self.locks
            .remove_if(&self.pool_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
