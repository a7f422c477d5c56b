//! CLI module
//!
//! Handles command-line argument parsing using clap.

pub mod args;

pub use args::{CliArgs, Command};

use clap::Parser;

/// Parse command-line arguments
///
/// Uses clap to parse arguments with automatic help generation and validation.
/// On error, clap prints the message and exits.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
