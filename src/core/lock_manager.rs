//! Per-account mutual exclusion for postings
//!
//! This module provides the `AccountLockManager` struct, which hands out one
//! async mutex per account key.
//!
//! # Design
//!
//! Locks live in a `DashMap` keyed by account id and are created lazily on
//! first use. Creation goes through the map's entry API, which holds the
//! shard's write lock while inserting, so two callers racing on a new key
//! always end up with the same mutex. Entries are never evicted.
//!
//! # Lock Ordering
//!
//! A posting touches two accounts. [`AccountLockManager::acquire_pair`] always
//! locks them in ascending byte order of their ids, regardless of which one
//! is the source. Every task therefore acquires locks in the same global
//! order, which rules out circular waits between postings that reference the
//! same pair in opposite directions. A self-transfer locks its account once.
//!
//! Guards are owned and release on drop, including when the future holding
//! them is cancelled.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

use crate::types::AccountId;

/// Registry of per-account locks
#[derive(Debug, Default)]
pub struct AccountLockManager {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

/// Exclusive hold on one or two accounts
///
/// Dropping the guard releases every lock it holds.
#[derive(Debug)]
pub struct AccountPairGuard {
    _first: OwnedMutexGuard<()>,
    _second: Option<OwnedMutexGuard<()>>,
}

impl AccountLockManager {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Lock a single account, waiting until it is free
    pub async fn acquire(&self, account_id: &str) -> OwnedMutexGuard<()> {
        let lock = self.lock_for(account_id);
        trace!(account = account_id, "waiting for account lock");
        lock.lock_owned().await
    }

    /// Lock both accounts of a posting in ascending id order
    ///
    /// The order the caller passes the accounts in does not matter.
    pub async fn acquire_pair(&self, from_account: &str, to_account: &str) -> AccountPairGuard {
        if from_account == to_account {
            return AccountPairGuard {
                _first: self.acquire(from_account).await,
                _second: None,
            };
        }

        let (first, second) = if from_account < to_account {
            (from_account, to_account)
        } else {
            (to_account, from_account)
        };

        let first_guard = self.acquire(first).await;
        let second_guard = self.acquire(second).await;

        AccountPairGuard {
            _first: first_guard,
            _second: Some(second_guard),
        }
    }

    /// Number of accounts that have a lock
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn lock_for(&self, account_id: &str) -> Arc<Mutex<()>> {
        if let Some(existing) = self.locks.get(account_id) {
            return Arc::clone(existing.value());
        }

        let entry = self
            .locks
            .entry(account_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())));
        Arc::clone(entry.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_locks_are_created_lazily() {
        let manager = AccountLockManager::new();
        assert!(manager.is_empty());

        let _guard = manager.acquire("alice").await;
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_registry_never_shrinks() {
        let manager = AccountLockManager::new();

        drop(manager.acquire_pair("alice", "bob").await);
        drop(manager.acquire("carol").await);

        assert_eq!(manager.len(), 3);
    }

    #[tokio::test]
    async fn test_self_transfer_locks_once() {
        let manager = AccountLockManager::new();

        // Would deadlock if the same mutex were taken twice
        let guard = timeout(Duration::from_secs(1), manager.acquire_pair("alice", "alice"))
            .await
            .expect("self-transfer must not deadlock");

        assert_eq!(manager.len(), 1);
        drop(guard);
    }

    #[tokio::test]
    async fn test_pair_guard_releases_both_locks_on_drop() {
        let manager = AccountLockManager::new();

        let guard = manager.acquire_pair("alice", "bob").await;
        drop(guard);

        let alice = timeout(Duration::from_secs(1), manager.acquire("alice")).await;
        let bob = timeout(Duration::from_secs(1), manager.acquire("bob")).await;
        assert!(alice.is_ok());
        assert!(bob.is_ok());
    }

    #[tokio::test]
    async fn test_held_account_blocks_other_pair() {
        let manager = AccountLockManager::new();

        let _held = manager.acquire("bob").await;

        let blocked = timeout(Duration::from_millis(50), manager.acquire_pair("alice", "bob")).await;
        assert!(blocked.is_err());

        let free = timeout(Duration::from_secs(1), manager.acquire_pair("alice", "carol")).await;
        assert!(free.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_does_not_hold_lock() {
        let manager = AccountLockManager::new();

        let held = manager.acquire("alice").await;
        let cancelled = timeout(Duration::from_millis(20), manager.acquire_pair("bob", "alice")).await;
        assert!(cancelled.is_err());
        drop(held);

        // "alice" < "bob", so the cancelled waiter never got past "alice";
        // both must be free now.
        let pair = timeout(Duration::from_secs(1), manager.acquire_pair("alice", "bob")).await;
        assert!(pair.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creation_yields_single_lock() {
        let manager = Arc::new(AccountLockManager::new());
        let mut handles = vec![];

        for _ in 0..32 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                let _guard = manager.acquire("shared").await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(manager.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_opposite_directions_do_not_deadlock() {
        let manager = Arc::new(AccountLockManager::new());
        let mut handles = vec![];

        for i in 0..200 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                let (from, to) = if i % 2 == 0 { ("alice", "bob") } else { ("bob", "alice") };
                let _guard = manager.acquire_pair(from, to).await;
                tokio::task::yield_now().await;
            }));
        }

        let all = async {
            for handle in handles {
                handle.await.unwrap();
            }
        };
        timeout(Duration::from_secs(10), all)
            .await
            .expect("opposite-direction postings deadlocked");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pair_guard_is_exclusive_per_account() {
        let manager = Arc::new(AccountLockManager::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        for i in 0..50 {
            let manager = Arc::clone(&manager);
            let inside = Arc::clone(&inside);
            handles.push(tokio::spawn(async move {
                let other = format!("acct-{}", i % 5);
                let _guard = manager.acquire_pair("hub", &other).await;

                let holders = inside.fetch_add(1, Ordering::SeqCst);
                assert_eq!(holders, 0, "two tasks held the hub account at once");
                tokio::task::yield_now().await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
    }
}
