//! Ledger entry type
//!
//! An entry is one signed amount recorded against one account. Entries are
//! immutable, append-only, and always written in matched debit/credit pairs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::AccountId;

/// A single signed movement on one account
///
/// Negative amounts are debits, positive amounts are credits. There is no
/// stored balance anywhere; balances are always the sum of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Derived from the owning transaction's id
    pub id: Uuid,

    /// The account this entry belongs to
    pub account_id: AccountId,

    /// Signed amount
    pub amount: Decimal,

    /// Same timestamp as the owning transaction
    pub created_at: DateTime<Utc>,
}
