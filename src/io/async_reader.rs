//! Asynchronous CSV reader with batch interface
//!
//! Streams posting requests from a CSV file in batches, so a bulk load keeps
//! constant memory no matter how large the input is.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of PostingRequests
//!                  ↓
//!           csv_format module
//!           (CsvPosting, convert_csv_record)
//! ```

use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

use crate::io::csv_format::{convert_csv_record, CsvPosting};
use crate::types::{LedgerError, PostingRequest};

/// Asynchronous CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    malformed: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            malformed: 0,
        }
    }

    /// Read up to `batch_size` posting requests
    ///
    /// Rows that fail to parse or convert are logged as
    /// [`LedgerError::ParseError`], counted and skipped.
    /// Returns an empty vector at end of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<PostingRequest> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut skipped = 0;
        let mut records = self.csv_reader.deserialize::<CsvPosting>();

        while batch.len() < batch_size {
            let error = match records.next().await {
                Some(Ok(csv_record)) => match convert_csv_record(csv_record) {
                    Ok(request) => {
                        batch.push(request);
                        continue;
                    }
                    Err(message) => LedgerError::parse_error(message),
                },
                Some(Err(e)) => LedgerError::from(e),
                None => break,
            };
            warn!(error = %error, "skipping malformed posting row");
            skipped += 1;
        }
        drop(records);

        self.malformed += skipped;
        batch
    }

    /// Number of rows skipped so far because they could not be read
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;
    use rust_decimal::Decimal;

    const HEADER: &str = "from_account,to_account,amount,idempotency_key\n";

    fn reader(rows: &str) -> AsyncReader<Cursor<Vec<u8>>> {
        AsyncReader::new(Cursor::new(format!("{}{}", HEADER, rows).into_bytes()))
    }

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let mut reader = reader("alice,bob,100.0,k1\nbob,carol,50.0,k2\ncarol,alice,1,k3\n");

        let batch = reader.read_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].idempotency_key, "k1");
        assert_eq!(batch[0].amount, Decimal::new(1000, 1));
        assert_eq!(batch[1].from_account, "bob");

        let batch = reader.read_batch(2).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].idempotency_key, "k3");

        assert!(reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut reader = reader("");
        assert!(reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_amount() {
        let mut reader = reader("alice,bob,lots,k1\nalice,bob,5,k2\n");

        let batch = reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].idempotency_key, "k2");
        assert_eq!(reader.malformed(), 1);
    }

    #[tokio::test]
    async fn test_async_reader_counts_unreadable_rows() {
        let mut bytes = HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(b"alice,b\xffb,1,k1\nalice,,,k2\nalice,bob,2,k3\n");
        let mut reader = AsyncReader::new(Cursor::new(bytes));

        let batch = reader.read_batch(1).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].idempotency_key, "k3");
        assert_eq!(reader.malformed(), 2);

        assert!(reader.read_batch(1).await.is_empty());
        assert_eq!(reader.malformed(), 2);
    }

    #[tokio::test]
    async fn test_async_reader_keeps_rows_for_engine_validation() {
        // Empty account and zero amount parse fine; the engine rejects them
        let mut reader = reader(",bob,5,k1\nalice,bob,0,k2\n");

        let batch = reader.read_batch(10).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].from_account, "");
        assert_eq!(batch[1].amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_async_reader_whitespace_handling() {
        let mut reader = reader("  alice  ,  bob  ,  100.0  ,  k1  \n");

        let batch = reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].from_account, "alice");
        assert_eq!(batch[0].idempotency_key, "k1");
    }
}
