//! Double-Entry Ledger Library
//! # Overview
//!
//! This library records money movements between accounts as matched pairs of
//! ledger entries, with idempotent submission and safe concurrent access to
//! shared accounts.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (LedgerEntry, Transaction, errors, events)
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Posting orchestration (idempotency, locking, persistence)
//!   - [`core::lock_manager`] - Per-account locks with deterministic ordering
//!   - [`core::balance`] - Balance derivation by summation
//!   - [`core::notifier`] - Best-effort completed-transaction events
//! - [`storage`] - In-memory and journal-file stores
//! - [`io`] - CSV input and output
//! - [`batch`] - Concurrent bulk posting from CSV
//! - [`cli`] - CLI arguments parsing
//!
//! # Posting
//!
//! A posting moves a positive amount from one account to another. It creates
//! one transaction and two entries, a debit of `-amount` on the source and a
//! credit of `+amount` on the destination, written atomically.
//!
//! - Re-submitting an idempotency key returns [`PostOutcome::Duplicate`] and writes nothing.
//! - Postings that share an account are serialized; others run in parallel.
//! - Balances are never stored; they are the sum of an account's entries.

pub mod batch;
pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod storage;
pub mod types;

pub use core::{LedgerStore, PostingEngine};
pub use storage::{JournalLedgerStore, MemoryLedgerStore};
pub use types::{
    AccountId, LedgerEntry, LedgerError, PostOutcome, PostingRequest, Transaction,
    TransactionCompleted,
};
