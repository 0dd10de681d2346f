//! Per-account serialization
//!
//! Mutations touching one account's profiles or following rows run one at a
//! time; different accounts proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Idle entries are pruned once the map grows past this size
const PRUNE_THRESHOLD: usize = 1024;

/// Map of account ID to its mutation lock
#[derive(Clone, Default)]
pub struct AccountLocks {
    locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `account_id`.
    ///
    /// Access is released when the returned guard is dropped.
    pub async fn acquire(&self, account_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() >= PRUNE_THRESHOLD {
                prune_idle(&mut locks);
            }
            locks
                .entry(account_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Drop entries nobody holds or waits on
fn prune_idle(locks: &mut HashMap<i64, Arc<Mutex<()>>>) {
    let before = locks.len();
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    tracing::debug!(
        removed = before - locks.len(),
        remaining = locks.len(),
        "Pruned idle account locks"
    );
}

impl std::fmt::Debug for AccountLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountLocks").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_account_serialized() {
        let locks = AccountLocks::new();
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let locks = locks.clone();
            let active = active.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(1).await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_accounts_do_not_block() {
        let locks = AccountLocks::new();
        let _first = locks.acquire(1).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_idle_locks_pruned_past_threshold() {
        let locks = AccountLocks::new();
        let held = locks.acquire(-1).await;
        for account_id in 0..(PRUNE_THRESHOLD - 1) as i64 {
            drop(locks.acquire(account_id).await);
        }
        assert_eq!(locks.locks.lock().await.len(), PRUNE_THRESHOLD);

        // The next acquire prunes every idle entry but keeps the held one
        let _next = locks.acquire(PRUNE_THRESHOLD as i64).await;
        let map = locks.locks.lock().await;
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&-1));
        assert!(map.contains_key(&(PRUNE_THRESHOLD as i64)));
        drop(map);
        drop(held);
    }
}
