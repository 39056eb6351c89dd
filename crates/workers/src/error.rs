//! Worker error types.

use broker::BrokerError;
use thiserror::Error;

/// Errors that can occur while running a worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Broker error.
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store refused to answer.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for worker results.
pub type Result<T> = std::result::Result<T, WorkerError>;
