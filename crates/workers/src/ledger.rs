//! Stock ledger trait and health check seam.

use async_trait::async_trait;

use crate::Result;

/// Stock on hand per product.
///
/// The stock responder only reads; the order-placement worker withdraws.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Quantity on hand, or `None` if the product is unknown.
    async fn on_hand(&self, product_id: i64) -> Result<Option<i64>>;

    /// Atomically removes `quantity` units if at least that many are on hand.
    ///
    /// Returns false, leaving the stock untouched, when there are not enough.
    async fn withdraw(&self, product_id: i64, quantity: u32) -> Result<bool>;
}

/// Something whose liveness a health responder can report.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Succeeds if the backing store is reachable.
    async fn check_health(&self) -> Result<()>;
}

/// Evaluates a stock check: the product must exist and have enough on hand.
pub fn is_available(on_hand: Option<i64>, quantity: u32) -> bool {
    on_hand.is_some_and(|stock| stock >= i64::from(quantity))
}
