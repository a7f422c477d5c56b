//! CSV format handling for posting requests, balances and entries
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvPosting structure for deserialization
//! - Conversion from CSV records to posting requests
//! - Balance and entry output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use std::collections::BTreeMap;
use std::io::Write;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::{AccountId, LedgerEntry, PostingRequest};

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns:
/// from_account, to_account, amount, idempotency_key
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvPosting {
    #[serde(default)]
    pub from_account: String,
    #[serde(default)]
    pub to_account: String,
    pub amount: Option<String>,
    #[serde(default)]
    pub idempotency_key: String,
}

/// Convert a CsvPosting to a PostingRequest
///
/// Only the amount is parsed here. Positivity, account ids and the
/// idempotency key are validated by the posting engine, so that rejected
/// rows are reported the same way as rejected API calls.
///
/// # Returns
///
/// Result containing either:
/// - Ok(PostingRequest) - Successfully converted record
/// - Err(String) - Error message describing the conversion failure
pub fn convert_csv_record(csv_record: CsvPosting) -> Result<PostingRequest, String> {
    let amount = match csv_record.amount {
        Some(amount_str) if !amount_str.trim().is_empty() => {
            Decimal::from_str(amount_str.trim()).map_err(|_| {
                format!(
                    "Invalid amount '{}' for key '{}'",
                    amount_str, csv_record.idempotency_key
                )
            })?
        }
        _ => {
            return Err(format!(
                "Posting with key '{}' requires an amount",
                csv_record.idempotency_key
            ))
        }
    };

    Ok(PostingRequest {
        from_account: csv_record.from_account,
        to_account: csv_record.to_account,
        amount,
        idempotency_key: csv_record.idempotency_key,
    })
}

/// Write balances in CSV format with columns: account, balance
///
/// Rows come out in the map's order (sorted by account id). Balances are
/// written at their full decimal precision.
pub fn write_balances_csv(
    balances: &BTreeMap<AccountId, Decimal>,
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["account", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for (account, balance) in balances {
        writer
            .write_record([account.as_str(), balance.to_string().as_str()])
            .map_err(|e| format!("Failed to write balance record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write entries in CSV format with columns: id, account_id, amount, created_at
pub fn write_entries_csv(entries: &[LedgerEntry], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["id", "account_id", "amount", "created_at"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for entry in entries {
        writer
            .write_record(&[
                entry.id.to_string(),
                entry.account_id.clone(),
                entry.amount.to_string(),
                entry.created_at.to_rfc3339(),
            ])
            .map_err(|e| format!("Failed to write entry record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
