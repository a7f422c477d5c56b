//! CSV input and output
//!
//! - `csv_format` - Posting rows in, balance and entry reports out
//! - `async_reader` - Batched streaming of posting rows for bulk loads

pub mod async_reader;
pub mod csv_format;

pub use async_reader::AsyncReader;
pub use csv_format::{convert_csv_record, write_balances_csv, write_entries_csv, CsvPosting};
