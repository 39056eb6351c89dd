use thiserror::Error;

/// Errors raised by the message channel.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The connection to the broker is gone.
    #[error("Broker connection closed")]
    ConnectionClosed,

    /// Subscribe was called for a destination that was never declared.
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    /// An exclusive queue already has its one consumer.
    #[error("Queue {0} is exclusive and already has a consumer")]
    ExclusiveQueueInUse(String),

    /// The broker refused a publish.
    #[error("Publish to '{destination}' failed: {reason}")]
    PublishFailed { destination: String, reason: String },

    /// A message body could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for broker operations.
pub type Result<T> = std::result::Result<T, BrokerError>;
