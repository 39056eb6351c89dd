//! Shared types for the order gateway and its workers.

pub mod destinations;
pub mod messages;
pub mod types;

pub use messages::{
    HealthCheckRequest, HealthReport, HealthStatus, InvalidOrderRequest, Notification, Order,
    OrderRequest, StockCheckReply, StockCheckRequest, ORDER_PLACED_MESSAGE,
};
pub use types::{CorrelationToken, ReplyAddress};
