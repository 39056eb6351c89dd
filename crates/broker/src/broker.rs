use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use serde::Serialize;

use crate::Result;
use crate::message::Message;
use crate::reply::ReplyQueue;

/// A stream of deliveries from one destination.
///
/// Dropping the stream cancels the consumer.
pub type MessageStream = Pin<Box<dyn Stream<Item = Message> + Send>>;

/// Declaration flags for a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueOptions {
    /// Survives broker restarts.
    pub durable: bool,
    /// At most one consumer may attach.
    pub exclusive: bool,
    /// Torn down when its last consumer goes away.
    pub auto_delete: bool,
}

impl QueueOptions {
    /// A shared, long-lived work queue (`check_stock`, `place_order`, ...).
    pub fn durable() -> Self {
        Self {
            durable: true,
            exclusive: false,
            auto_delete: false,
        }
    }

    /// A private queue that lives only as long as its one consumer.
    pub fn private() -> Self {
        Self {
            durable: false,
            exclusive: true,
            auto_delete: true,
        }
    }
}

/// Minimal capability the gateway and workers need from a message broker.
///
/// Implementations must be safe to share between tasks: concurrent
/// publishes from many sagas may not interleave.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Declares a destination. Declaring an existing destination is a no-op.
    async fn declare(&self, name: &str, options: QueueOptions) -> Result<()>;

    /// Publishes a message to `message.destination`.
    ///
    /// A message addressed to a destination that does not exist is dropped.
    async fn publish(&self, message: Message) -> Result<()>;

    /// Attaches a consumer to a declared destination.
    ///
    /// Consumers of the same destination compete: each message goes to one
    /// of them.
    async fn subscribe(&self, name: &str) -> Result<MessageStream>;

    /// Declares a broker-named private destination and attaches the caller
    /// as its only consumer.
    async fn open_reply_queue(&self) -> Result<ReplyQueue>;
}

/// Convenience methods available on every broker.
#[async_trait]
pub trait MessageBrokerExt: MessageBroker {
    /// Fire-and-forget publish of a JSON payload.
    async fn publish_json<T: Serialize + Sync>(
        &self,
        destination: &str,
        payload: &T,
    ) -> Result<()> {
        let message = Message::builder(destination).json(payload)?.build();
        self.publish(message).await
    }
}

impl<B: MessageBroker + ?Sized> MessageBrokerExt for B {}

#[async_trait]
impl<B: MessageBroker + ?Sized> MessageBroker for std::sync::Arc<B> {
    async fn declare(&self, name: &str, options: QueueOptions) -> Result<()> {
        (**self).declare(name, options).await
    }

    async fn publish(&self, message: Message) -> Result<()> {
        (**self).publish(message).await
    }

    async fn subscribe(&self, name: &str) -> Result<MessageStream> {
        (**self).subscribe(name).await
    }

    async fn open_reply_queue(&self) -> Result<ReplyQueue> {
        (**self).open_reply_queue().await
    }
}
