//! Order processing saga constants and settings.

use std::time::Duration;

/// The saga type identifier for order processing.
pub const SAGA_TYPE: &str = "OrderProcessing";

/// Step name: ask the stock responder.
pub const STEP_CHECK_STOCK: &str = "check_stock";

/// Step name: publish the order.
pub const STEP_PLACE_ORDER: &str = "place_order";

/// Step name: publish the user notification.
pub const STEP_NOTIFY: &str = "notify";

/// Status reported for a completed saga.
pub const STATUS_PROCESSED: &str = "Order processed successfully";

/// Default budget for the stock check.
pub const DEFAULT_STOCK_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for [`SagaCoordinator`](crate::SagaCoordinator).
#[derive(Debug, Clone)]
pub struct SagaConfig {
    /// How long to wait for the stock responder.
    pub stock_check_timeout: Duration,
    /// Tell the user when an order does not go through, whether for
    /// insufficient stock or an internal failure.
    pub notify_on_rejection: bool,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            stock_check_timeout: DEFAULT_STOCK_CHECK_TIMEOUT,
            notify_on_rejection: true,
        }
    }
}
