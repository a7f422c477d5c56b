//! Ledger store implementations
//!
//! - `memory` - In-process store; everything behind one lock
//! - `journal` - Durable append-only journal file replayed on open
//!
//! Both keep their rows in a [`LedgerState`], which enforces the
//! idempotency-key uniqueness constraint.

pub mod journal;
pub mod memory;

pub use journal::JournalLedgerStore;
pub use memory::MemoryLedgerStore;

use std::collections::HashSet;

use crate::core::traits::SaveOutcome;
use crate::types::{LedgerEntry, Transaction};

/// Rows of a ledger, in creation order
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    transactions: Vec<Transaction>,
    entries: Vec<LedgerEntry>,
    idempotency_keys: HashSet<String>,
}

impl LedgerState {
    pub(crate) fn contains_key(&self, idempotency_key: &str) -> bool {
        self.idempotency_keys.contains(idempotency_key)
    }

    /// Append the three rows, or nothing if the key is taken
    pub(crate) fn insert(
        &mut self,
        transaction: &Transaction,
        debit: &LedgerEntry,
        credit: &LedgerEntry,
    ) -> SaveOutcome {
        if !self
            .idempotency_keys
            .insert(transaction.idempotency_key.clone())
        {
            return SaveOutcome::DuplicateKey;
        }

        self.transactions.push(transaction.clone());
        self.entries.push(debit.clone());
        self.entries.push(credit.clone());
        SaveOutcome::Saved
    }

    pub(crate) fn entries_for_account(&self, account_id: &str) -> Vec<LedgerEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.account_id == account_id)
            .cloned()
            .collect()
    }

    pub(crate) fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.clone()
    }

    pub(crate) fn transactions(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }
}
