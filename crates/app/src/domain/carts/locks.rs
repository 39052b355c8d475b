//! Per-owner critical sections.

use std::sync::{Arc, Mutex, PoisonError};

use rustc_hash::FxHashMap;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::owners::Owner;

/// Serialises read-then-write sequences on one owner's cart within this
/// process. Different owners never wait on each other.
#[derive(Debug, Default)]
pub(crate) struct OwnerLocks {
    locks: Mutex<FxHashMap<Owner, Arc<AsyncMutex<()>>>>,
}

impl OwnerLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the owner's cart.
    pub(crate) async fn acquire(&self, owner: &Owner) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

            // Drop entries nobody holds or waits on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);

            Arc::clone(locks.entry(owner.clone()).or_default())
        };

        lock.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
