//! The consumption loop every worker runs.

use async_trait::async_trait;
use broker::{Message, MessageBroker, QueueOptions};
use futures_util::StreamExt;

use crate::Result;

/// A worker bound to one destination.
///
/// `handle_message` owns all failure handling for a single message: it
/// logs and returns, so one bad message never stops the loop.
#[async_trait]
pub trait QueueWorker: Send + Sync {
    /// Destination this worker consumes.
    fn queue(&self) -> &str;

    /// Handles one delivery.
    async fn handle_message(&self, message: Message);
}

/// Declares the worker's queue and feeds it every delivery, one at a time,
/// until the broker ends the stream.
///
/// Running several of these against the same queue spreads the load: the
/// broker hands each message to exactly one of them.
pub async fn run_worker<B, W>(broker: &B, worker: &W) -> Result<()>
where
    B: MessageBroker,
    W: QueueWorker,
{
    let queue = worker.queue().to_string();
    broker.declare(&queue, QueueOptions::durable()).await?;
    let mut deliveries = broker.subscribe(&queue).await?;
    tracing::info!(%queue, "worker consuming");

    while let Some(message) = deliveries.next().await {
        metrics::counter!("worker_messages_received_total", "queue" => queue.clone()).increment(1);
        worker.handle_message(message).await;
    }

    tracing::info!(%queue, "delivery stream ended, worker stopping");
    Ok(())
}
