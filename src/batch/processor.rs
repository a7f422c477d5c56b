//! Concurrent posting of request batches
//!
//! This module provides the `BatchProcessor` struct, which posts every
//! request of a batch as its own tokio task.
//!
//! # Ordering
//!
//! Requests are not partitioned or ordered: the engine's account locks
//! serialize requests that share an account, and requests on disjoint
//! accounts run in parallel. A semaphore caps how many requests are in
//! flight at once.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::error;

use crate::core::PostingEngine;
use crate::types::{LedgerError, PostOutcome, PostingRequest};

/// Result of posting a single request
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The request that was posted
    pub request: PostingRequest,

    /// The outcome of posting it
    pub result: Result<PostOutcome, LedgerError>,
}

/// Posts batches of requests concurrently
#[derive(Clone)]
pub struct BatchProcessor {
    engine: PostingEngine,
    permits: Arc<Semaphore>,
}

impl BatchProcessor {
    /// Create a processor allowing up to `max_concurrency` postings in flight
    pub fn new(engine: PostingEngine, max_concurrency: usize) -> Self {
        Self {
            engine,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Post every request of a batch and wait for all of them
    ///
    /// # Returns
    ///
    /// One `ProcessingResult` per request that ran to completion, in the
    /// order the requests were submitted. A task that panics is logged and
    /// has no result.
    pub async fn process_batch(&self, batch: Vec<PostingRequest>) -> Vec<ProcessingResult> {
        let mut tasks = Vec::with_capacity(batch.len());

        for request in batch {
            let engine = self.engine.clone();
            let permits = Arc::clone(&self.permits);
            tasks.push(tokio::spawn(async move {
                // The semaphore is never closed
                let _permit = permits.acquire_owned().await.ok();
                let result = engine.post(request.clone()).await;
                ProcessingResult { request, result }
            }));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(result) => results.push(result),
                Err(e) => error!(error = ?e, "posting task panicked"),
            }
        }

        results
    }
}
