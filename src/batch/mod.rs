//! Bulk posting from CSV files
//!
//! Reads posting requests in batches and posts each batch concurrently
//! through a shared [`PostingEngine`].
//!
//! # Architecture
//!
//! ```text
//! replay_file
//!     ├── BatchConfig (batch_size, max_concurrency)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (bounded concurrent posting)
//!         └── PostingEngine
//! ```
//!
//! Batches are read one at a time; a batch finishes before the next one is
//! read, which bounds memory. Within a batch, postings complete in any order.

pub mod processor;

pub use processor::{BatchProcessor, ProcessingResult};

use std::path::Path;

use tracing::{info, warn};

use crate::core::PostingEngine;
use crate::io::AsyncReader;
use crate::types::{LedgerError, PostOutcome};

/// Configuration for batch processing
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of requests read per batch
    pub batch_size: usize,
    /// Maximum number of postings in flight
    pub max_concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrency: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, max_concurrency: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrency = if max_concurrency == 0 {
            warn!(
                max_concurrency,
                default = default.max_concurrency,
                "invalid max concurrency, using default"
            );
            default.max_concurrency
        } else {
            max_concurrency
        };

        Self {
            batch_size,
            max_concurrency,
        }
    }
}

/// Counts of what happened to each request of a replay
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Newly committed transactions
    pub posted: usize,
    /// Requests whose idempotency key was already committed
    pub duplicates: usize,
    /// Requests that failed validation
    pub rejected: usize,
    /// Requests that failed in storage
    pub failed: usize,
    /// Input rows that could not be read as a posting
    pub malformed: usize,
}

impl ReplaySummary {
    fn record(&mut self, result: &ProcessingResult) {
        match &result.result {
            Ok(PostOutcome::Posted(_)) => self.posted += 1,
            Ok(PostOutcome::Duplicate) => self.duplicates += 1,
            Err(e) if e.is_validation() => {
                warn!(key = %result.request.idempotency_key, error = %e, "posting rejected");
                self.rejected += 1;
            }
            Err(e) => {
                warn!(key = %result.request.idempotency_key, error = %e, "posting failed");
                self.failed += 1;
            }
        }
    }
}

/// Post every request in a CSV file
///
/// # Returns
///
/// * `Ok(ReplaySummary)` once every row has been attempted
/// * `Err(LedgerError::FileNotFound)` if the input cannot be opened
pub async fn replay_file(
    engine: &PostingEngine,
    input_path: &Path,
    config: &BatchConfig,
) -> Result<ReplaySummary, LedgerError> {
    let file = tokio::fs::File::open(input_path)
        .await
        .map_err(|_| LedgerError::FileNotFound {
            path: input_path.display().to_string(),
        })?;

    // Wrap tokio file in a compatibility layer for csv-async
    let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
    let mut reader = AsyncReader::new(compat_file);

    let processor = BatchProcessor::new(engine.clone(), config.max_concurrency);
    let mut summary = ReplaySummary::default();

    loop {
        let batch = reader.read_batch(config.batch_size).await;
        if batch.is_empty() {
            break;
        }

        for result in processor.process_batch(batch).await {
            summary.record(&result);
        }
    }
    summary.malformed = reader.malformed();

    info!(
        posted = summary.posted,
        duplicates = summary.duplicates,
        rejected = summary.rejected,
        failed = summary.failed,
        malformed = summary.malformed,
        "replay finished"
    );

    Ok(summary)
}
