//! Best-effort publication of completed transactions
//!
//! The posting engine hands each committed transaction to a [`Notifier`],
//! which queues it on an unbounded channel and returns immediately. A
//! background task drains the channel into an [`EventPublisher`]. Publish
//! failures are logged and dropped; they never reach the caller and never
//! undo a posting.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::traits::EventPublisher;
use crate::types::{LedgerError, TransactionCompleted};

/// Topic completed transactions are published on
pub const TRANSACTIONS_COMPLETED_TOPIC: &str = "transactions.completed";

/// Handle for queueing completed-transaction events
///
/// Cloning is cheap. The background task stops once every clone is dropped
/// and the queue is drained.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<TransactionCompleted>,
}

impl Notifier {
    /// Start the background publishing task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(publisher: Arc<dyn EventPublisher>) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<TransactionCompleted>();

        let handle = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                match publisher
                    .publish(TRANSACTIONS_COMPLETED_TOPIC, &event)
                    .await
                {
                    Ok(()) => debug!(transaction_id = %event.transaction_id, "event published"),
                    Err(e) => warn!(
                        transaction_id = %event.transaction_id,
                        error = %e,
                        "failed to publish transaction completed event"
                    ),
                }
            }
        });

        (Self { sender }, handle)
    }

    /// Queue an event without waiting for it to be published
    pub fn notify(&self, event: TransactionCompleted) {
        if let Err(e) = self.sender.send(event) {
            warn!(
                transaction_id = %e.0.transaction_id,
                "notifier stopped; dropping transaction completed event"
            );
        }
    }
}

/// Publishes events to the log as JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPublisher;

#[async_trait]
impl EventPublisher for TracingPublisher {
    async fn publish(&self, topic: &str, event: &TransactionCompleted) -> Result<(), LedgerError> {
        let payload = serde_json::to_string(event)
            .map_err(|e| LedgerError::notification(e.to_string()))?;
        info!(topic, payload = %payload, "transaction completed");
        Ok(())
    }
}
