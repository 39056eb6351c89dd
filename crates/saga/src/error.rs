//! Saga error types.

use broker::{BrokerError, RpcError};
use common::InvalidOrderRequest;
use thiserror::Error;

use crate::state::SagaStage;

/// Ways a saga can abort. A stock rejection is an outcome, not an error.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The order was rejected before any message was sent.
    #[error("Invalid order request: {0}")]
    InvalidRequest(#[from] InvalidOrderRequest),

    /// The stock responder did not answer in time.
    #[error("Timed out after {timeout:?} waiting for stock check")]
    StockCheckTimedOut { timeout: std::time::Duration },

    /// The stock check failed for any reason other than a timeout.
    #[error("Stock check failed: {0}")]
    StockCheck(RpcError),

    /// The order could not be handed off.
    #[error("Failed to publish order: {0}")]
    OrderPlacement(#[source] BrokerError),
}

impl SagaError {
    /// The stage at which the saga aborted.
    pub fn stage(&self) -> SagaStage {
        match self {
            SagaError::InvalidRequest(_) => SagaStage::Validating,
            SagaError::StockCheckTimedOut { .. } | SagaError::StockCheck(_) => {
                SagaStage::CheckingStock
            }
            SagaError::OrderPlacement(_) => SagaStage::PlacingOrder,
        }
    }

    /// Returns true if the request got as far as the broker, i.e. the
    /// user placed a real order that then failed.
    pub fn reached_broker(&self) -> bool {
        !matches!(self, SagaError::InvalidRequest(_))
    }

    /// Returns true if the caller should see a gateway timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SagaError::StockCheckTimedOut { .. })
    }
}

impl From<RpcError> for SagaError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::TimedOut { timeout, .. } => SagaError::StockCheckTimedOut { timeout },
            other => SagaError::StockCheck(other),
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
