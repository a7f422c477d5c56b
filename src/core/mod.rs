//! Core business logic module
//!
//! This module contains the posting components:
//! - `traits` - Store and publisher seams
//! - `lock_manager` - Per-account locks with deterministic ordering
//! - `balance` - Balance derivation from entries
//! - `engine` - Posting orchestration
//! - `notifier` - Best-effort completed-transaction events

pub mod balance;
pub mod engine;
pub mod lock_manager;
pub mod notifier;
pub mod traits;

pub use balance::BalanceCalculator;
pub use engine::PostingEngine;
pub use lock_manager::{AccountLockManager, AccountPairGuard};
pub use notifier::{Notifier, TracingPublisher, TRANSACTIONS_COMPLETED_TOPIC};
pub use traits::{EventPublisher, LedgerStore, SaveOutcome};
