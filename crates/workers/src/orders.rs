//! Order-placement worker: consumes `place_order`.

use std::sync::Arc;

use async_trait::async_trait;
use broker::{Message, MessageBroker};
use chrono::{DateTime, Utc};
use common::Order;
use common::destinations::PLACE_ORDER;
use tokio::sync::RwLock;

use crate::Result;
use crate::consumer::{QueueWorker, run_worker};
use crate::ledger::StockLedger;

/// Service name used in health reports.
pub const SERVICE_NAME: &str = "orders";

/// An order the worker accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order: Order,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct OrderBookState {
    placed: Vec<PlacedOrder>,
    rejected: Vec<Order>,
}

/// Record of what the worker did with each order it received.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    state: Arc<RwLock<OrderBookState>>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders whose stock was withdrawn, oldest first.
    pub async fn placed(&self) -> Vec<PlacedOrder> {
        self.state.read().await.placed.clone()
    }

    /// Orders that arrived after their stock was gone.
    pub async fn rejected(&self) -> Vec<Order> {
        self.state.read().await.rejected.clone()
    }

    /// Returns the number of placed orders.
    pub async fn placed_count(&self) -> usize {
        self.state.read().await.placed.len()
    }

    async fn record_placed(&self, order: Order) {
        self.state.write().await.placed.push(PlacedOrder {
            order,
            placed_at: Utc::now(),
        });
    }

    async fn record_rejected(&self, order: Order) {
        self.state.write().await.rejected.push(order);
    }
}

/// What became of one `place_order` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    Placed(Order),
    /// Stock ran out between the check and the placement.
    Rejected(Order),
    /// The ledger could not be updated.
    Failed(Order),
    Dropped(&'static str),
}

/// Withdraws stock for each placed order and records it.
///
/// Stock is only checked, not reserved, by the gateway. Two orders racing
/// for the last units both pass the check; the second loses here.
#[derive(Clone)]
pub struct OrderPlacementWorker<B, L> {
    broker: B,
    ledger: L,
    book: OrderBook,
}

impl<B, L> OrderPlacementWorker<B, L>
where
    B: MessageBroker,
    L: StockLedger,
{
    pub fn new(broker: B, ledger: L, book: OrderBook) -> Self {
        Self {
            broker,
            ledger,
            book,
        }
    }

    /// Consumes `place_order` until the broker goes away.
    pub async fn run(&self) -> Result<()> {
        run_worker(&self.broker, self).await
    }

    #[tracing::instrument(skip(self, message), fields(message_id = %message.message_id))]
    pub async fn handle(&self, message: &Message) -> PlacementOutcome {
        let order: Order = match message.decode() {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!(error = %e, body = %message.body_lossy(), "malformed order dropped");
                return PlacementOutcome::Dropped("malformed body");
            }
        };

        match self.ledger.withdraw(order.product_id, order.quantity).await {
            Ok(true) => {
                self.book.record_placed(order).await;
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(
                    order_id = order.order_id,
                    product_id = order.product_id,
                    quantity = order.quantity,
                    "order placed"
                );
                PlacementOutcome::Placed(order)
            }
            Ok(false) => {
                self.book.record_rejected(order).await;
                metrics::counter!("orders_rejected_total").increment(1);
                tracing::warn!(
                    order_id = order.order_id,
                    product_id = order.product_id,
                    "stock gone before placement"
                );
                PlacementOutcome::Rejected(order)
            }
            Err(e) => {
                tracing::error!(order_id = order.order_id, error = %e, "failed to withdraw stock");
                PlacementOutcome::Failed(order)
            }
        }
    }
}

#[async_trait]
impl<B, L> QueueWorker for OrderPlacementWorker<B, L>
where
    B: MessageBroker,
    L: StockLedger,
{
    fn queue(&self) -> &str {
        PLACE_ORDER
    }

    async fn handle_message(&self, message: Message) {
        self.handle(&message).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStockLedger;
    use broker::InMemoryBroker;

    fn order(order_id: i64, quantity: u32) -> Order {
        Order {
            order_id,
            product_id: 101,
            user_id: 7,
            quantity,
        }
    }

    fn message_for(order: &Order) -> Message {
        Message::builder(PLACE_ORDER).json(order).unwrap().build()
    }

    #[tokio::test]
    async fn placement_withdraws_stock_and_records_order() {
        let ledger = InMemoryStockLedger::seeded();
        let book = OrderBook::new();
        let worker = OrderPlacementWorker::new(InMemoryBroker::new(), ledger.clone(), book.clone());

        let outcome = worker.handle(&message_for(&order(1, 3))).await;

        assert_eq!(outcome, PlacementOutcome::Placed(order(1, 3)));
        assert_eq!(ledger.on_hand(101).await.unwrap(), Some(7));
        assert_eq!(book.placed_count().await, 1);
        assert_eq!(book.placed().await[0].order, order(1, 3));
    }

    #[tokio::test]
    async fn losing_the_race_for_stock_rejects() {
        let ledger = InMemoryStockLedger::with_stock([(101, 4)]);
        let book = OrderBook::new();
        let worker = OrderPlacementWorker::new(InMemoryBroker::new(), ledger.clone(), book.clone());

        worker.handle(&message_for(&order(1, 3))).await;
        let outcome = worker.handle(&message_for(&order(2, 3))).await;

        assert_eq!(outcome, PlacementOutcome::Rejected(order(2, 3)));
        assert_eq!(book.rejected().await, vec![order(2, 3)]);
        assert_eq!(ledger.on_hand(101).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn malformed_order_is_dropped() {
        let book = OrderBook::new();
        let worker = OrderPlacementWorker::new(
            InMemoryBroker::new(),
            InMemoryStockLedger::seeded(),
            book.clone(),
        );
        let message = Message::builder(PLACE_ORDER)
            .raw("application/json", "[]")
            .build();

        assert_eq!(
            worker.handle(&message).await,
            PlacementOutcome::Dropped("malformed body")
        );
        assert_eq!(book.placed_count().await, 0);
    }

    #[tokio::test]
    async fn ledger_outage_fails_the_placement() {
        let ledger = InMemoryStockLedger::seeded();
        ledger.set_offline(true);
        let worker =
            OrderPlacementWorker::new(InMemoryBroker::new(), ledger, OrderBook::new());

        let outcome = worker.handle(&message_for(&order(1, 1))).await;
        assert_eq!(outcome, PlacementOutcome::Failed(order(1, 1)));
    }
}
