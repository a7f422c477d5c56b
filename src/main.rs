//! Double-Entry Ledger CLI
//!
//! Command-line interface for posting transfers and inspecting the ledger.
//!
//! # Usage
//!
//! ```bash
//! ledger --journal ledger.journal post --from alice --to bob --amount 100.00 --key k1
//! ledger --journal ledger.journal balance alice
//! ledger --journal ledger.journal entries --account bob > entries.csv
//! ledger replay --max-concurrent 8 postings.csv > balances.csv
//! ```
//!
//! Command output goes to stdout; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success (including a duplicate posting)
//! - 1: Error (invalid posting, storage failure, file not found, etc.)

use std::process;
use std::sync::Arc;

use double_entry_ledger::batch::{self, BatchConfig};
use double_entry_ledger::cli::{self, CliArgs, Command};
use double_entry_ledger::core::{Notifier, TracingPublisher};
use double_entry_ledger::io::{write_balances_csv, write_entries_csv};
use double_entry_ledger::logging::init_logging;
use double_entry_ledger::{
    JournalLedgerStore, LedgerStore, MemoryLedgerStore, PostOutcome, PostingEngine,
};

fn main() {
    let args = cli::parse_args();
    init_logging(&args.log_level, args.log_json);

    let config = args.command.to_batch_config();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.max_concurrency)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: Failed to create tokio runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(args, config)) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(args: CliArgs, config: BatchConfig) -> Result<(), String> {
    let store: Arc<dyn LedgerStore> = match &args.journal {
        Some(path) => Arc::new(JournalLedgerStore::open(path).map_err(|e| e.to_string())?),
        None => Arc::new(MemoryLedgerStore::new()),
    };

    let (notifier, notifier_task) = Notifier::spawn(Arc::new(TracingPublisher));
    let engine = PostingEngine::new(store).with_notifier(notifier);

    let mut stdout = std::io::stdout();
    let result = match args.command {
        Command::Post {
            from_account,
            to_account,
            amount,
            idempotency_key,
        } => engine
            .post_transaction(&from_account, &to_account, amount, &idempotency_key)
            .await
            .map(|outcome| match outcome {
                PostOutcome::Posted(tx) => println!("posted {}", tx.id),
                PostOutcome::Duplicate => println!("duplicate"),
            })
            .map_err(|e| e.to_string()),

        Command::Balance { account } => engine
            .balance(&account)
            .await
            .map(|balance| println!("{}", balance))
            .map_err(|e| e.to_string()),

        Command::Entries { account } => {
            let entries = match account {
                Some(account) => engine.account_entries(&account).await,
                None => engine.list_entries().await,
            };
            match entries {
                Ok(entries) => write_entries_csv(&entries, &mut stdout),
                Err(e) => Err(e.to_string()),
            }
        }

        Command::Replay { input_file, .. } => {
            match batch::replay_file(&engine, &input_file, &config).await {
                Ok(_summary) => match engine.balances().await {
                    Ok(balances) => write_balances_csv(&balances, &mut stdout),
                    Err(e) => Err(e.to_string()),
                },
                Err(e) => Err(e.to_string()),
            }
        }
    };

    // Let queued events drain before exiting
    drop(engine);
    let _ = notifier_task.await;

    result
}
