//! Message bodies exchanged between the gateway and the workers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Text of the notification sent once an order has been handed off.
pub const ORDER_PLACED_MESSAGE: &str = "order placed";

/// An order submitted by a caller of the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub order_id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub quantity: u32,
}

/// Reasons an [`OrderRequest`] is refused before any message is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOrderRequest {
    #[error("quantity must be positive")]
    NonPositiveQuantity,
}

impl OrderRequest {
    /// Checks the invariants a caller-supplied order must satisfy.
    pub fn validate(&self) -> Result<(), InvalidOrderRequest> {
        if self.quantity == 0 {
            return Err(InvalidOrderRequest::NonPositiveQuantity);
        }
        Ok(())
    }

    /// The stock-check question derived from this order.
    pub fn stock_check(&self) -> StockCheckRequest {
        StockCheckRequest {
            product_id: self.product_id,
            quantity: self.quantity,
        }
    }

    /// The order record handed to the order-placement worker.
    pub fn to_order(&self) -> Order {
        Order {
            order_id: self.order_id,
            product_id: self.product_id,
            user_id: self.user_id,
            quantity: self.quantity,
        }
    }
}

/// Request body published to `check_stock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCheckRequest {
    pub product_id: i64,
    pub quantity: u32,
}

/// Reply body sent back to the requester's reply address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCheckReply {
    pub product_id: i64,
    pub is_available: bool,
}

/// A placed order, published to `place_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub quantity: u32,
}

/// A user-facing message, published to `notifications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: i64,
    pub message: String,
}

impl Notification {
    pub fn new(user_id: i64, message: impl Into<String>) -> Self {
        Self {
            user_id,
            message: message.into(),
        }
    }

    /// Success notification for a handed-off order.
    pub fn order_placed(user_id: i64) -> Self {
        Self::new(user_id, ORDER_PLACED_MESSAGE)
    }

    /// Failure notification for an order refused for lack of stock.
    pub fn stock_unavailable(user_id: i64, product_id: i64) -> Self {
        Self::new(
            user_id,
            format!("Order failed: insufficient stock for product {product_id}."),
        )
    }

    /// Failure notification for an order lost to a timeout or broker fault.
    pub fn internal_error(user_id: i64) -> Self {
        Self::new(user_id, "Order failed due to an internal error.")
    }
}

/// Liveness of a worker as reported over the health-check fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unreachable,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Unreachable => "unreachable",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reply body for a health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub service: String,
    pub status: HealthStatus,
    pub database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn healthy(service: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            status: HealthStatus::Healthy,
            database: database.into(),
            error: None,
        }
    }

    pub fn unhealthy(service: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            status: HealthStatus::Unhealthy,
            database: "disconnected".to_string(),
            error: Some(error.into()),
        }
    }

    /// Placeholder for a service that did not answer within the window.
    pub fn unreachable(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            status: HealthStatus::Unreachable,
            database: "unknown".to_string(),
            error: Some("no reply within health-check window".to_string()),
        }
    }
}

/// Body of a health check. Carries nothing but the asking service's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckRequest {
    pub requested_by: String,
}
