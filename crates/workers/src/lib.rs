//! Back-end workers that serve the order gateway over the broker.
//!
//! Every worker consumes one destination in a loop, handles one message at
//! a time, and never lets a failure on one message stop the loop:
//! - [`StockResponder`]: answers `check_stock` with exactly one reply
//! - [`OrderPlacementWorker`]: withdraws stock for `place_order`
//! - [`NotificationWorker`]: delivers `notifications`
//! - [`HealthResponder`]: answers `health_check.<service>` requests

pub mod consumer;
pub mod error;
pub mod health;
pub mod ledger;
pub mod memory;
pub mod notifications;
pub mod orders;
pub mod postgres;
pub mod stock;

pub use consumer::{QueueWorker, run_worker};
pub use error::{Result, WorkerError};
pub use health::HealthResponder;
pub use ledger::{HealthCheck, StockLedger, is_available};
pub use memory::InMemoryStockLedger;
pub use notifications::{
    InMemoryNotificationSink, NotificationOutcome, NotificationSink, NotificationWorker,
};
pub use orders::{OrderBook, OrderPlacementWorker, PlacedOrder, PlacementOutcome};
pub use postgres::PostgresStockLedger;
pub use stock::{StockCheckOutcome, StockResponder};
