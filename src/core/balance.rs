//! Balance derivation
//!
//! Balances are never stored. They are the sum of an account's entries,
//! computed with `Decimal` end to end.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use super::traits::LedgerStore;
use crate::types::{AccountId, LedgerEntry, LedgerError};

/// Derives balances from stored entries
#[derive(Clone)]
pub struct BalanceCalculator {
    store: Arc<dyn LedgerStore>,
}

impl BalanceCalculator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Balance of one account; zero if it has no entries
    pub async fn balance(&self, account_id: &str) -> Result<Decimal, LedgerError> {
        let entries = self.store.entries_for_account(account_id).await?;
        sum_entries(account_id, &entries)
    }

    /// Balance of every account that has at least one entry, sorted by account id
    pub async fn balances(&self) -> Result<BTreeMap<AccountId, Decimal>, LedgerError> {
        let mut balances: BTreeMap<AccountId, Decimal> = BTreeMap::new();

        for entry in self.store.all_entries().await? {
            let balance = balances.entry(entry.account_id.clone()).or_default();
            *balance = balance
                .checked_add(entry.amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("balance", &entry.account_id))?;
        }

        Ok(balances)
    }

    /// Sum of all entries in the ledger
    ///
    /// Every transaction contributes a zero-sum pair, so this is zero for a
    /// consistent ledger.
    pub async fn trial_balance(&self) -> Result<Decimal, LedgerError> {
        let entries = self.store.all_entries().await?;
        sum_ledger(&entries)
    }
}

/// Checked sum of one account's entry amounts
pub fn sum_entries(account_id: &str, entries: &[LedgerEntry]) -> Result<Decimal, LedgerError> {
    checked_sum(entries).ok_or_else(|| LedgerError::arithmetic_overflow("balance", account_id))
}

/// Checked sum of entry amounts across every account
pub fn sum_ledger(entries: &[LedgerEntry]) -> Result<Decimal, LedgerError> {
    checked_sum(entries).ok_or_else(|| LedgerError::ledger_overflow("trial balance"))
}

fn checked_sum(entries: &[LedgerEntry]) -> Option<Decimal> {
    entries
        .iter()
        .try_fold(Decimal::ZERO, |acc, entry| acc.checked_add(entry.amount))
}
