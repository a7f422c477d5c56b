//! Transaction-related types for the ledger
//!
//! This module defines the posting request a caller submits, the persisted
//! transaction it becomes, and the outcome reported back to the caller.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::LedgerEntry;
use super::error::LedgerError;

/// Account identifier
///
/// Accounts are implicit: an account exists as soon as an entry references it.
pub type AccountId = String;

/// A request to move `amount` from one account to another
///
/// This is the caller's intent. Nothing about it is persisted until the
/// posting engine turns it into a [`Transaction`] and its two entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingRequest {
    /// Account that is debited
    pub from_account: AccountId,

    /// Account that is credited
    pub to_account: AccountId,

    /// Amount to move; must be strictly positive
    pub amount: Decimal,

    /// Client-supplied token identifying one logical posting attempt
    pub idempotency_key: String,
}

impl PostingRequest {
    pub fn new(
        from_account: impl Into<AccountId>,
        to_account: impl Into<AccountId>,
        amount: Decimal,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            from_account: from_account.into(),
            to_account: to_account.into(),
            amount,
            idempotency_key: idempotency_key.into(),
        }
    }

    /// Check the amount and both account identifiers
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the request can be posted
    /// * `Err(LedgerError::NonPositiveAmount)` if `amount <= 0`
    /// * `Err(LedgerError::MissingAccount)` if either account identifier is blank
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::non_positive_amount(self.amount));
        }
        if self.from_account.trim().is_empty() {
            return Err(LedgerError::missing_account("from"));
        }
        if self.to_account.trim().is_empty() {
            return Err(LedgerError::missing_account("to"));
        }
        Ok(())
    }
}

/// A persisted transfer between two accounts
///
/// Exactly one `Transaction` yields exactly two [`LedgerEntry`] values, built
/// by [`Transaction::entries`]. Transactions are never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// System-generated identifier
    pub id: Uuid,

    /// Client-supplied key, unique across all persisted transactions
    pub idempotency_key: String,

    pub from_account: AccountId,
    pub to_account: AccountId,

    /// Positive amount moved from `from_account` to `to_account`
    pub amount: Decimal,

    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction for a request with a fresh id and the current time
    pub fn from_request(request: &PostingRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            idempotency_key: request.idempotency_key.clone(),
            from_account: request.from_account.clone(),
            to_account: request.to_account.clone(),
            amount: request.amount,
            created_at: Utc::now(),
        }
    }

    /// Build the matched debit and credit entries for this transaction
    ///
    /// Both entries carry the transaction's timestamp, and their ids are
    /// derived from the transaction id, so calling this twice yields the
    /// same pair.
    pub fn entries(&self) -> (LedgerEntry, LedgerEntry) {
        let debit = LedgerEntry {
            id: Uuid::new_v5(&self.id, b"debit"),
            account_id: self.from_account.clone(),
            amount: -self.amount,
            created_at: self.created_at,
        };
        let credit = LedgerEntry {
            id: Uuid::new_v5(&self.id, b"credit"),
            account_id: self.to_account.clone(),
            amount: self.amount,
            created_at: self.created_at,
        };
        (debit, credit)
    }
}

/// Result of a posting attempt that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    /// The transaction and both entries were committed by this call
    Posted(Transaction),

    /// A transaction with the same idempotency key already exists; nothing was written
    Duplicate,
}

impl PostOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, PostOutcome::Duplicate)
    }
}
