//! Transaction posting orchestration
//!
//! This module provides the `PostingEngine` struct, which turns posting
//! requests into committed double-entry transactions.
//!
//! # Flow
//!
//! ```text
//! Received → DuplicateCheck ─┬─ duplicate ──────────────────────────────→ Done
//!                            └─ new → Validated → LocksAcquired → Persisted
//!                                     → NotifyBestEffort → Done
//! ```
//!
//! 1. The idempotency pre-check reads the store without taking any lock.
//! 2. The request is validated. A rejected request never touches the lock
//!    registry, so invalid account ids do not grow it.
//! 3. Both account locks are taken in ascending id order.
//! 4. The transaction and its debit/credit pair are built.
//! 5. The store persists all three rows atomically. A uniqueness collision on
//!    the idempotency key (a concurrent duplicate that slipped past step 1)
//!    is reported as a duplicate, same as step 1.
//! 6. A completed event is queued for the notifier.
//! 7. The locks are released when the guard drops, on every exit path.
//!
//! # Architecture
//!
//! ```text
//! PostingEngine
//!     ├── Arc<dyn LedgerStore>       (atomic persistence + queries)
//!     ├── Arc<AccountLockManager>    (per-account locks)
//!     ├── BalanceCalculator          (derived balances)
//!     └── Option<Notifier>           (best-effort events)
//! ```
//!
//! The engine is cheap to clone and is meant to be shared across tasks. No
//! internal retries are performed; callers retry with the same idempotency
//! key.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, error, info, instrument};

use super::balance::BalanceCalculator;
use super::lock_manager::AccountLockManager;
use super::notifier::Notifier;
use super::traits::{LedgerStore, SaveOutcome};
use crate::types::{
    AccountId, LedgerEntry, LedgerError, PostOutcome, PostingRequest, Transaction,
    TransactionCompleted,
};

/// Posts transfers between accounts with exactly-once semantics per idempotency key
#[derive(Clone)]
pub struct PostingEngine {
    store: Arc<dyn LedgerStore>,
    locks: Arc<AccountLockManager>,
    balances: BalanceCalculator,
    notifier: Option<Notifier>,
}

impl PostingEngine {
    /// Create an engine over a store, without event notification
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            balances: BalanceCalculator::new(Arc::clone(&store)),
            store,
            locks: Arc::new(AccountLockManager::new()),
            notifier: None,
        }
    }

    /// Publish a completed event through `notifier` after every posting
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Post a transfer of `amount` from one account to another
    ///
    /// Convenience wrapper around [`PostingEngine::post`].
    pub async fn post_transaction(
        &self,
        from_account: &str,
        to_account: &str,
        amount: Decimal,
        idempotency_key: &str,
    ) -> Result<PostOutcome, LedgerError> {
        self.post(PostingRequest::new(
            from_account,
            to_account,
            amount,
            idempotency_key,
        ))
        .await
    }

    /// Post a transfer
    ///
    /// # Returns
    ///
    /// * `Ok(PostOutcome::Posted)` - The transaction and both entries were committed
    /// * `Ok(PostOutcome::Duplicate)` - The idempotency key was already used; nothing written
    /// * `Err(e)` with `e.is_validation()` - The request was rejected; nothing written
    /// * `Err(LedgerError::Storage)` - Persistence failed; nothing written
    ///
    /// # Cancellation
    ///
    /// Dropping the returned future releases any locks held. A posting
    /// dropped before the store starts its commit leaves no rows behind; one
    /// the store has already started may still commit, exactly once.
    #[instrument(
        name = "post",
        skip_all,
        fields(key = %request.idempotency_key, from = %request.from_account, to = %request.to_account)
    )]
    pub async fn post(&self, request: PostingRequest) -> Result<PostOutcome, LedgerError> {
        if request.idempotency_key.trim().is_empty() {
            return Err(LedgerError::MissingIdempotencyKey);
        }

        if self
            .store
            .transaction_exists(&request.idempotency_key)
            .await?
        {
            debug!("idempotency key already posted");
            return Ok(PostOutcome::Duplicate);
        }

        request.validate()?;

        let _guard = self
            .locks
            .acquire_pair(&request.from_account, &request.to_account)
            .await;

        let transaction = Transaction::from_request(&request);
        let (debit, credit) = transaction.entries();

        match self
            .store
            .save_transaction_with_entries(&transaction, &debit, &credit)
            .await
        {
            Ok(SaveOutcome::Saved) => {}
            Ok(SaveOutcome::DuplicateKey) => {
                debug!("idempotency key committed concurrently");
                return Ok(PostOutcome::Duplicate);
            }
            Err(e) => {
                error!(error = %e, "failed to persist transaction");
                return Err(e);
            }
        }

        info!(transaction_id = %transaction.id, amount = %transaction.amount, "transaction posted");

        if let Some(notifier) = &self.notifier {
            notifier.notify(TransactionCompleted::from(&transaction));
        }

        Ok(PostOutcome::Posted(transaction))
    }

    /// Balance of one account, derived from its entries
    pub async fn balance(&self, account_id: &str) -> Result<Decimal, LedgerError> {
        self.balances.balance(account_id).await
    }

    /// Balances of every account with entries, sorted by account id
    pub async fn balances(&self) -> Result<BTreeMap<AccountId, Decimal>, LedgerError> {
        self.balances.balances().await
    }

    /// Sum of all entries; zero for a consistent ledger
    pub async fn trial_balance(&self) -> Result<Decimal, LedgerError> {
        self.balances.trial_balance().await
    }

    /// Every entry in the ledger, in creation order
    pub async fn list_entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.store.all_entries().await
    }

    /// Entries for one account, in creation order
    pub async fn account_entries(&self, account_id: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.store.entries_for_account(account_id).await
    }

    /// Every transaction in the ledger, in creation order
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, LedgerError> {
        self.store.all_transactions().await
    }

    /// The lock registry, shared by every clone of this engine
    pub fn locks(&self) -> &AccountLockManager {
        &self.locks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLedgerStore;
    use rstest::rstest;

    fn engine() -> PostingEngine {
        PostingEngine::new(Arc::new(MemoryLedgerStore::new()))
    }

    #[tokio::test]
    async fn test_post_creates_balanced_pair() {
        let engine = engine();

        let outcome = engine
            .post_transaction("alice", "bob", Decimal::new(10000, 2), "k1")
            .await
            .unwrap();

        let PostOutcome::Posted(tx) = outcome else {
            panic!("expected a new posting");
        };
        assert_eq!(tx.idempotency_key, "k1");

        let entries = engine.list_entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].amount + entries[1].amount, Decimal::ZERO);
        assert!(entries.iter().all(|e| e.amount.abs() == Decimal::new(10000, 2)));
        assert_eq!(entries, vec![tx.entries().0, tx.entries().1]);
    }

    #[tokio::test]
    async fn test_resubmission_is_duplicate() {
        let engine = engine();

        let first = engine
            .post_transaction("alice", "bob", Decimal::new(10000, 2), "k1")
            .await
            .unwrap();
        let second = engine
            .post_transaction("alice", "bob", Decimal::new(10000, 2), "k1")
            .await
            .unwrap();

        assert!(!first.is_duplicate());
        assert_eq!(second, PostOutcome::Duplicate);
        assert_eq!(engine.list_transactions().await.unwrap().len(), 1);
        assert_eq!(engine.list_entries().await.unwrap().len(), 2);
        assert_eq!(engine.balance("alice").await.unwrap(), Decimal::new(-10000, 2));
        assert_eq!(engine.balance("bob").await.unwrap(), Decimal::new(10000, 2));
    }

    #[tokio::test]
    async fn test_duplicate_takes_no_locks() {
        let engine = engine();
        engine
            .post_transaction("alice", "bob", Decimal::ONE, "k1")
            .await
            .unwrap();

        let _held = engine.locks().acquire("alice").await;

        // Would block forever if the duplicate path waited on "alice"
        let outcome = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            engine.post_transaction("alice", "bob", Decimal::ONE, "k1"),
        )
        .await
        .expect("duplicate must not wait on account locks")
        .unwrap();
        assert_eq!(outcome, PostOutcome::Duplicate);
    }

    #[rstest]
    #[case::zero("alice", "bob", Decimal::ZERO, "k2")]
    #[case::negative("alice", "bob", Decimal::new(-5, 0), "k2")]
    #[case::missing_from("", "bob", Decimal::ONE, "k2")]
    #[case::missing_to("alice", "", Decimal::ONE, "k2")]
    #[case::missing_key("alice", "bob", Decimal::ONE, "")]
    #[tokio::test]
    async fn test_invalid_requests_write_nothing(
        #[case] from: &str,
        #[case] to: &str,
        #[case] amount: Decimal,
        #[case] key: &str,
    ) {
        let engine = engine();

        let error = engine
            .post_transaction(from, to, amount, key)
            .await
            .unwrap_err();

        assert!(error.is_validation(), "unexpected error: {}", error);
        assert!(engine.list_transactions().await.unwrap().is_empty());
        assert!(engine.list_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_requests_leave_no_account_locks() {
        let engine = engine();

        for i in 0..100 {
            let from = format!("junk-{}", i);
            let key = format!("k{}", i);
            let error = engine
                .post_transaction(&from, "", Decimal::ONE, &key)
                .await
                .unwrap_err();
            assert_eq!(error, LedgerError::missing_account("to"));
        }
        let _ = engine
            .post_transaction("alice", "bob", Decimal::ZERO, "k-zero")
            .await;

        assert!(engine.locks().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_key_can_be_reused() {
        let engine = engine();

        assert!(engine
            .post_transaction("alice", "bob", Decimal::ZERO, "k1")
            .await
            .is_err());
        let outcome = engine
            .post_transaction("alice", "bob", Decimal::ONE, "k1")
            .await
            .unwrap();

        assert!(matches!(outcome, PostOutcome::Posted(_)));
    }

    #[tokio::test]
    async fn test_self_transfer_nets_to_zero() {
        let engine = engine();

        let outcome = engine
            .post_transaction("alice", "alice", Decimal::new(50, 0), "k3")
            .await
            .unwrap();
        assert!(matches!(outcome, PostOutcome::Posted(_)));

        let amounts: Vec<Decimal> = engine
            .account_entries("alice")
            .await
            .unwrap()
            .iter()
            .map(|e| e.amount)
            .collect();
        assert_eq!(amounts, vec![Decimal::new(-50, 0), Decimal::new(50, 0)]);
        assert_eq!(engine.balance("alice").await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_locks_released_after_validation_failure() {
        let engine = engine();

        let _ = engine
            .post_transaction("alice", "bob", Decimal::ZERO, "k1")
            .await;

        let guard = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            engine.locks().acquire_pair("alice", "bob"),
        )
        .await;
        assert!(guard.is_ok());
    }

    #[tokio::test]
    async fn test_notifier_receives_posted_transactions() {
        use crate::core::traits::EventPublisher;
        use async_trait::async_trait;
        use std::sync::Mutex;

        #[derive(Default)]
        struct Collect(Mutex<Vec<TransactionCompleted>>);

        #[async_trait]
        impl EventPublisher for Collect {
            async fn publish(
                &self,
                _topic: &str,
                event: &TransactionCompleted,
            ) -> Result<(), LedgerError> {
                self.0.lock().unwrap().push(event.clone());
                Ok(())
            }
        }

        let publisher = Arc::new(Collect::default());
        let (notifier, handle) = Notifier::spawn(publisher.clone());
        let engine = engine().with_notifier(notifier);

        let PostOutcome::Posted(tx) = engine
            .post_transaction("alice", "bob", Decimal::new(725, 2), "k1")
            .await
            .unwrap()
        else {
            panic!("expected a new posting");
        };
        engine
            .post_transaction("alice", "bob", Decimal::new(725, 2), "k1")
            .await
            .unwrap();
        drop(engine);
        handle.await.unwrap();

        let events = publisher.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].transaction_id, tx.id);
        assert_eq!(events[0].amount, Decimal::new(725, 2));
    }
}
