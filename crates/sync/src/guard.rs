//! Per-user single-flight guard.
//!
//! The reconciler owns a user's cache directory while it checks, rebuilds or
//! persists. Calls for the same user queue behind one async mutex; calls for
//! different users never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map of user id to that user's reconciliation lock.
#[derive(Debug, Default)]
pub struct UserLocks {
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`'s cache.
    ///
    /// The guard is owned so it can move into a background persistence task.
    /// Locks nobody holds or waits on are dropped from the map here, so it
    /// only tracks users with work in flight.
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut inflight = self.inflight.lock().await;
            inflight.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(
                inflight
                    .entry(user_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// Number of users currently tracked.
    pub async fn tracked_users(&self) -> usize {
        self.inflight.lock().await.len()
    }
}
