//! In-memory ledger store
//!
//! Rows live for the lifetime of the process. A save takes the write lock
//! once, checks the idempotency key and appends all three rows under it, so
//! readers see either none or all of them.

use std::sync::RwLock;

use async_trait::async_trait;

use super::LedgerState;
use crate::core::traits::{LedgerStore, SaveOutcome};
use crate::types::{LedgerEntry, LedgerError, Transaction};

/// Thread-safe in-memory [`LedgerStore`]
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    state: RwLock<LedgerState>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&LedgerState) -> T) -> Result<T, LedgerError> {
        let state = self
            .state
            .read()
            .map_err(|_| LedgerError::storage("memory store lock poisoned"))?;
        Ok(f(&state))
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn transaction_exists(&self, idempotency_key: &str) -> Result<bool, LedgerError> {
        self.read(|state| state.contains_key(idempotency_key))
    }

    async fn save_transaction_with_entries(
        &self,
        transaction: &Transaction,
        debit: &LedgerEntry,
        credit: &LedgerEntry,
    ) -> Result<SaveOutcome, LedgerError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| LedgerError::storage("memory store lock poisoned"))?;
        Ok(state.insert(transaction, debit, credit))
    }

    async fn entries_for_account(&self, account_id: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.read(|state| state.entries_for_account(account_id))
    }

    async fn all_entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.read(LedgerState::entries)
    }

    async fn all_transactions(&self) -> Result<Vec<Transaction>, LedgerError> {
        self.read(LedgerState::transactions)
    }
}
