//! Outbound "transaction completed" fact

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::{AccountId, Transaction};

/// Published after a transaction commits, for consumers outside the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCompleted {
    pub transaction_id: Uuid,
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

impl From<&Transaction> for TransactionCompleted {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction_id: tx.id,
            from_account: tx.from_account.clone(),
            to_account: tx.to_account.clone(),
            amount: tx.amount,
            occurred_at: Utc::now(),
        }
    }
}
