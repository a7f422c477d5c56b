//! Core traits for ledger storage and event publication
//!
//! These are the seams between the posting engine and its collaborators.
//! Storage is part of the atomicity boundary of a posting; publication is not.

use async_trait::async_trait;

use crate::types::{LedgerEntry, LedgerError, Transaction, TransactionCompleted};

/// Result of a successful call to [`LedgerStore::save_transaction_with_entries`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The transaction and both entries are now durable and visible
    Saved,

    /// A transaction with the same idempotency key is already stored; nothing was written
    DuplicateKey,
}

/// Durable storage for transactions and their entries
///
/// # Contract
///
/// - `save_transaction_with_entries` is all-or-nothing across the three rows.
///   Readers never observe a transaction without both entries or vice versa.
/// - The idempotency key is unique. A save that collides with a stored key
///   returns `Ok(SaveOutcome::DuplicateKey)`, never an error.
/// - Any other failure returns `Err` and leaves nothing visible.
/// - Entries are never mutated or removed once saved.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Whether a transaction with this idempotency key is stored
    async fn transaction_exists(&self, idempotency_key: &str) -> Result<bool, LedgerError>;

    /// Atomically store a transaction with its debit and credit entries
    async fn save_transaction_with_entries(
        &self,
        transaction: &Transaction,
        debit: &LedgerEntry,
        credit: &LedgerEntry,
    ) -> Result<SaveOutcome, LedgerError>;

    /// Entries for one account, in creation order
    async fn entries_for_account(&self, account_id: &str) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// All entries, in creation order
    async fn all_entries(&self) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// All transactions, in creation order
    async fn all_transactions(&self) -> Result<Vec<Transaction>, LedgerError>;
}

/// Outbound publication of completed transactions
///
/// Implementations talk to whatever lies outside the ledger (a broker, a log).
/// Failures are reported to the caller, which only logs them.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, event: &TransactionCompleted) -> Result<(), LedgerError>;
}
