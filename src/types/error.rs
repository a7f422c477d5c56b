//! Error types for the ledger
//!
//! This module defines all error types that can occur while posting, storing
//! and reading ledger data.
//!
//! # Error Categories
//!
//! - **Validation Errors**: Non-positive amount, missing account or idempotency key
//! - **Storage Errors**: I/O failures, corrupted journal, poisoned store state
//! - **Arithmetic Errors**: Overflow while summing entries
//! - **Notification Errors**: Failed event publication (logged, never surfaced)
//! - **Input Errors**: Missing files, malformed CSV rows
//!
//! A duplicate submission is not an error; it is reported as
//! [`PostOutcome::Duplicate`](crate::types::PostOutcome::Duplicate).

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Posting amount is zero or negative
    #[error("Amount must be strictly positive, got {amount}")]
    NonPositiveAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Source or destination account identifier is empty
    #[error("Missing {side} account")]
    MissingAccount {
        /// Which side of the posting is missing ("from" or "to")
        side: String,
    },

    /// Posting was submitted without an idempotency key
    #[error("Missing idempotency key")]
    MissingIdempotencyKey,

    /// The underlying store failed
    ///
    /// Atomicity of the store guarantees that no partial rows remain.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure
        message: String,
    },

    /// The journal contains a record that cannot be replayed
    #[error("Journal corrupted at line {line}: {message}")]
    JournalCorrupted {
        /// 1-based line number of the bad record
        line: usize,
        /// What was wrong with it
        message: String,
    },

    /// Summing entries overflowed the decimal range
    #[error("Arithmetic overflow in {operation}{}", account.as_ref().map(|a| format!(" for account {}", a)).unwrap_or_default())]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account being summed; `None` when summing across the whole ledger
        account: Option<String>,
    },

    /// Publishing a completed-transaction event failed
    #[error("Notification error: {message}")]
    Notification {
        /// Description of the publish failure
        message: String,
    },

    /// Input file not found
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// A posting row could not be read from CSV input
    ///
    /// Bulk loads log it, count the row as malformed and keep going.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Storage {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(error: serde_json::Error) -> Self {
        LedgerError::Storage {
            message: format!("serialization failed: {}", error),
        }
    }
}

impl From<csv_async::Error> for LedgerError {
    fn from(error: csv_async::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a NonPositiveAmount error
    pub fn non_positive_amount(amount: Decimal) -> Self {
        LedgerError::NonPositiveAmount { amount }
    }

    /// Create a MissingAccount error
    pub fn missing_account(side: &str) -> Self {
        LedgerError::MissingAccount {
            side: side.to_string(),
        }
    }

    /// Create a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        LedgerError::Storage {
            message: message.into(),
        }
    }

    /// Create a JournalCorrupted error
    pub fn journal_corrupted(line: usize, message: impl Into<String>) -> Self {
        LedgerError::JournalCorrupted {
            line,
            message: message.into(),
        }
    }

    /// Create an ArithmeticOverflow error for one account
    pub fn arithmetic_overflow(operation: &str, account: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: Some(account.to_string()),
        }
    }

    /// Create an ArithmeticOverflow error for a sum across all accounts
    pub fn ledger_overflow(operation: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: None,
        }
    }

    /// Create a ParseError for a row with no position information
    pub fn parse_error(message: impl Into<String>) -> Self {
        LedgerError::ParseError {
            line: None,
            message: message.into(),
        }
    }

    /// Create a Notification error
    pub fn notification(message: impl Into<String>) -> Self {
        LedgerError::Notification {
            message: message.into(),
        }
    }

    /// Whether this error rejects the caller's input rather than reporting a failure
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::NonPositiveAmount { .. }
                | LedgerError::MissingAccount { .. }
                | LedgerError::MissingIdempotencyKey
        )
    }
}
