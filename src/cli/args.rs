use crate::batch::BatchConfig;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Double-entry ledger with idempotent postings
#[derive(Parser, Debug)]
#[command(name = "ledger")]
#[command(about = "Double-entry ledger with idempotent postings", long_about = None)]
pub struct CliArgs {
    /// Journal file holding the ledger; in-memory when omitted
    #[arg(
        long = "journal",
        value_name = "PATH",
        global = true,
        help = "Journal file to load and append to (default: in-memory ledger)"
    )]
    pub journal: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "info",
        global = true,
        help = "Log level filter, e.g. 'info' or 'double_entry_ledger=debug'"
    )]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Ledger operations
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Post a transfer between two accounts
    Post {
        /// Account to debit
        #[arg(long = "from", value_name = "ACCOUNT")]
        from_account: String,

        /// Account to credit
        #[arg(long = "to", value_name = "ACCOUNT")]
        to_account: String,

        /// Amount to transfer (decimal, strictly positive)
        #[arg(long = "amount", value_name = "AMOUNT", allow_negative_numbers = true)]
        amount: Decimal,

        /// Idempotency key identifying this posting
        #[arg(long = "key", value_name = "KEY")]
        idempotency_key: String,
    },

    /// Print the balance of an account
    Balance {
        /// Account to report
        #[arg(value_name = "ACCOUNT")]
        account: String,
    },

    /// Write ledger entries as CSV
    Entries {
        /// Only list entries for this account
        #[arg(long = "account", value_name = "ACCOUNT")]
        account: Option<String>,
    },

    /// Post every row of a CSV file and write the resulting balances
    Replay {
        /// Input CSV with columns from_account,to_account,amount,idempotency_key
        #[arg(value_name = "INPUT")]
        input_file: PathBuf,

        /// Number of postings per batch
        #[arg(
            long = "batch-size",
            value_name = "SIZE",
            help = "Number of postings per batch (default: 1000)"
        )]
        batch_size: Option<usize>,

        /// Maximum number of postings in flight
        #[arg(
            long = "max-concurrent",
            value_name = "COUNT",
            help = "Maximum number of postings processed concurrently (default: CPU cores)"
        )]
        max_concurrent: Option<usize>,
    },
}

impl Command {
    /// Create a BatchConfig from replay arguments
    ///
    /// Missing values (and every non-replay command) use the defaults.
    pub fn to_batch_config(&self) -> BatchConfig {
        match self {
            Command::Replay {
                batch_size,
                max_concurrent,
                ..
            } if batch_size.is_some() || max_concurrent.is_some() => {
                let default = BatchConfig::default();
                BatchConfig::new(
                    batch_size.unwrap_or(default.batch_size),
                    max_concurrent.unwrap_or(default.max_concurrency),
                )
            }
            _ => BatchConfig::default(),
        }
    }
}
