//! Saga orchestration for order processing.
//!
//! One saga turns an incoming order into three broker operations:
//! 1. Check stock (request/reply, the only step that waits)
//! 2. Place the order (fire-and-forget)
//! 3. Notify the user (fire-and-forget, best-effort)
//!
//! Steps short-circuit on the first failure. Nothing is persisted and
//! nothing is compensated: stock is checked, never reserved, and once the
//! order is handed off the saga is past its point of no return.

pub mod coordinator;
pub mod error;
pub mod order_fulfillment;
pub mod outcome;
pub mod state;

pub use coordinator::SagaCoordinator;
pub use error::{Result, SagaError};
pub use order_fulfillment::SagaConfig;
pub use outcome::{OrderConfirmation, SagaOutcome, StockRejection};
pub use state::SagaStage;
