//! Durable append-only journal store
//!
//! Every committed transaction is one line in the journal file:
//!
//! ```text
//! <crc32 of json, 8 hex digits> <json {"transaction", "debit", "credit"}>\n
//! ```
//!
//! A save writes the whole line and calls `sync_data` before publishing the
//! rows to readers; the synced line is the commit point. All three rows
//! therefore become durable together or not at all.
//!
//! # Threading
//!
//! Saves queue on an async writer mutex, then append, sync and publish on
//! tokio's blocking pool. Readers only take the in-memory state lock, which
//! is held for the insert alone, so an fsync never parks a runtime worker.
//! Once a save reaches the blocking pool it runs to completion even if the
//! caller stops waiting for it.
//!
//! # Recovery
//!
//! Opening a journal replays it into memory. A final line that is missing its
//! newline or fails its checksum is a write that never committed: it is
//! dropped and truncated away. A bad line with more data after it, or two
//! records with the same idempotency key, means the file was damaged and
//! opening fails with [`LedgerError::JournalCorrupted`].

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::LedgerState;
use crate::core::traits::{LedgerStore, SaveOutcome};
use crate::types::{LedgerEntry, LedgerError, Transaction};

#[derive(Serialize)]
struct RecordRef<'a> {
    transaction: &'a Transaction,
    debit: &'a LedgerEntry,
    credit: &'a LedgerEntry,
}

#[derive(Deserialize)]
struct Record {
    transaction: Transaction,
    debit: LedgerEntry,
    credit: LedgerEntry,
}

/// [`LedgerStore`] backed by a journal file
///
/// One writer process per journal file; nothing guards against a second
/// process appending to the same path.
#[derive(Debug)]
pub struct JournalLedgerStore {
    writer: Arc<Mutex<JournalWriter>>,
    state: Arc<RwLock<LedgerState>>,
}

#[derive(Debug)]
struct JournalWriter {
    path: PathBuf,
    file: File,
    /// Length of the committed prefix of the file
    len: u64,
    /// Set when a failed append could not be rolled back
    broken: bool,
}

impl JournalLedgerStore {
    /// Open (or create) a journal and replay its committed records
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;

        let (state, len) = replay(&contents)?;
        if len < contents.len() as u64 {
            warn!(
                path = %path.display(),
                discarded_bytes = contents.len() as u64 - len,
                "discarding uncommitted journal tail"
            );
            file.set_len(len)?;
            file.sync_data()?;
        }
        file.seek(SeekFrom::Start(len))?;

        info!(
            path = %path.display(),
            transactions = state.transactions().len(),
            "journal opened"
        );

        Ok(Self {
            writer: Arc::new(Mutex::new(JournalWriter {
                path,
                file,
                len,
                broken: false,
            })),
            state: Arc::new(RwLock::new(state)),
        })
    }

    fn read<T>(&self, f: impl FnOnce(&LedgerState) -> T) -> Result<T, LedgerError> {
        let state = read_state(&self.state)?;
        Ok(f(&state))
    }
}

fn read_state(state: &RwLock<LedgerState>) -> Result<RwLockReadGuard<'_, LedgerState>, LedgerError> {
    state
        .read()
        .map_err(|_| LedgerError::storage("journal state lock poisoned"))
}

impl JournalWriter {
    /// Append, sync and publish one record; blocking
    fn commit(
        &mut self,
        state: &RwLock<LedgerState>,
        record: &Record,
    ) -> Result<SaveOutcome, LedgerError> {
        if self.broken {
            return Err(LedgerError::storage(
                "journal is unusable after a failed rollback",
            ));
        }
        if read_state(state)?.contains_key(&record.transaction.idempotency_key) {
            return Ok(SaveOutcome::DuplicateKey);
        }

        let line = encode_line(&record.transaction, &record.debit, &record.credit)?;
        if let Err(write_error) = self.append(&line) {
            error!(
                path = %self.path.display(),
                transaction_id = %record.transaction.id,
                error = %write_error,
                "journal append failed"
            );
            if let Err(rollback_error) = self.rollback() {
                self.broken = true;
                return Err(LedgerError::storage(format!(
                    "{}; rollback failed: {}",
                    write_error, rollback_error
                )));
            }
            return Err(write_error.into());
        }

        match state.write() {
            Ok(mut state) => Ok(state.insert(&record.transaction, &record.debit, &record.credit)),
            Err(_) => {
                // The line is durable but readers cannot see it
                self.broken = true;
                Err(LedgerError::storage("journal state lock poisoned"))
            }
        }
    }

    fn append(&mut self, line: &[u8]) -> io::Result<()> {
        self.file.write_all(line)?;
        self.file.sync_data()?;
        self.len += line.len() as u64;
        Ok(())
    }

    fn rollback(&mut self) -> io::Result<()> {
        self.file.set_len(self.len)?;
        self.file.seek(SeekFrom::Start(self.len))?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for JournalLedgerStore {
    async fn transaction_exists(&self, idempotency_key: &str) -> Result<bool, LedgerError> {
        self.read(|state| state.contains_key(idempotency_key))
    }

    async fn save_transaction_with_entries(
        &self,
        transaction: &Transaction,
        debit: &LedgerEntry,
        credit: &LedgerEntry,
    ) -> Result<SaveOutcome, LedgerError> {
        let record = Record {
            transaction: transaction.clone(),
            debit: debit.clone(),
            credit: credit.clone(),
        };
        let mut writer = Arc::clone(&self.writer).lock_owned().await;
        let state = Arc::clone(&self.state);

        tokio::task::spawn_blocking(move || writer.commit(&state, &record))
            .await
            .map_err(|e| LedgerError::storage(format!("journal writer task failed: {}", e)))?
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

fn encode_line(
    transaction: &Transaction,
    debit: &LedgerEntry,
    credit: &LedgerEntry,
) -> Result<Vec<u8>, LedgerError> {
    let json = serde_json::to_vec(&RecordRef {
        transaction,
        debit,
        credit,
    })?;

    let mut line = format!("{:08x} ", crc32fast::hash(&json)).into_bytes();
    line.extend_from_slice(&json);
    line.push(b'\n');
    Ok(line)
}

fn decode_line(line: &[u8]) -> Result<Record, String> {
    let line = std::str::from_utf8(line).map_err(|e| format!("invalid utf-8: {}", e))?;
    let (checksum, json) = line
        .split_once(' ')
        .ok_or_else(|| "missing checksum".to_string())?;
    let expected =
        u32::from_str_radix(checksum, 16).map_err(|e| format!("invalid checksum: {}", e))?;
    if crc32fast::hash(json.as_bytes()) != expected {
        return Err("checksum mismatch".to_string());
    }
    serde_json::from_str(json).map_err(|e| format!("invalid record: {}", e))
}

/// Rebuild state from journal bytes
///
/// Returns the state and the length of the committed prefix.
fn replay(contents: &[u8]) -> Result<(LedgerState, u64), LedgerError> {
    let mut state = LedgerState::default();
    let mut offset = 0usize;
    let mut line_number = 0usize;

    while offset < contents.len() {
        line_number += 1;
        let rest = &contents[offset..];

        // No newline: the write was cut short
        let Some(newline) = rest.iter().position(|b| *b == b'\n') else {
            break;
        };
        let next = offset + newline + 1;

        match decode_line(&rest[..newline]) {
            Ok(record) => {
                let outcome = state.insert(&record.transaction, &record.debit, &record.credit);
                if outcome == SaveOutcome::DuplicateKey {
                    return Err(LedgerError::journal_corrupted(
                        line_number,
                        format!(
                            "duplicate idempotency key '{}'",
                            record.transaction.idempotency_key
                        ),
                    ));
                }
            }
            Err(_) if next == contents.len() => break,
            Err(message) => return Err(LedgerError::journal_corrupted(line_number, message)),
        }

        offset = next;
    }

    Ok((state, offset as u64))
}
