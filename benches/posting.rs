//! Benchmark suite for concurrent posting
//!
//! Compares batches whose postings touch disjoint account pairs with batches
//! that all funnel through one shared account, using the divan benchmarking
//! framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench --bench posting
//! ```

use double_entry_ledger::batch::BatchProcessor;
use double_entry_ledger::{MemoryLedgerStore, PostingEngine, PostingRequest};
use rust_decimal::Decimal;
use std::sync::Arc;

fn main() {
    divan::main();
}

const BATCH_SIZES: &[usize] = &[100, 1_000];

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
}

fn run_batch(requests: Vec<PostingRequest>) {
    let runtime = runtime();
    let engine = PostingEngine::new(Arc::new(MemoryLedgerStore::new()));
    let processor = BatchProcessor::new(engine, num_cpus::get());

    let results = runtime.block_on(processor.process_batch(requests));
    assert!(results.iter().all(|r| r.result.is_ok()));
}

/// Every posting uses its own pair of accounts
#[divan::bench(args = BATCH_SIZES)]
fn disjoint_accounts(bencher: divan::Bencher, size: usize) {
    bencher
        .with_inputs(|| {
            (0..size)
                .map(|i| {
                    PostingRequest::new(
                        format!("src-{}", i),
                        format!("dst-{}", i),
                        Decimal::new(1000, 2),
                        format!("k{}", i),
                    )
                })
                .collect::<Vec<_>>()
        })
        .bench_values(run_batch);
}

/// Every posting credits the same account
#[divan::bench(args = BATCH_SIZES)]
fn shared_account(bencher: divan::Bencher, size: usize) {
    bencher
        .with_inputs(|| {
            (0..size)
                .map(|i| {
                    PostingRequest::new(
                        format!("src-{}", i),
                        "treasury",
                        Decimal::new(1000, 2),
                        format!("k{}", i),
                    )
                })
                .collect::<Vec<_>>()
        })
        .bench_values(run_batch);
}

/// Half the batch repeats idempotency keys already seen in the batch
#[divan::bench(args = BATCH_SIZES)]
fn repeated_keys(bencher: divan::Bencher, size: usize) {
    bencher
        .with_inputs(|| {
            (0..size)
                .map(|i| {
                    PostingRequest::new(
                        format!("src-{}", i % 16),
                        format!("dst-{}", i % 16),
                        Decimal::ONE,
                        format!("k{}", i / 2),
                    )
                })
                .collect::<Vec<_>>()
        })
        .bench_values(run_batch);
}
