//! Types module
//!
//! Contains core data structures used throughout the ledger.
//! This module organizes types into logical submodules:
//! - `entry`: Ledger entries (one signed amount on one account)
//! - `transaction`: Posting requests, persisted transactions and outcomes
//! - `event`: The outbound "transaction completed" fact
//! - `error`: Error types for the ledger

pub mod entry;
pub mod error;
pub mod event;
pub mod transaction;

pub use entry::LedgerEntry;
pub use error::LedgerError;
pub use event::TransactionCompleted;
pub use transaction::{AccountId, PostOutcome, PostingRequest, Transaction};
