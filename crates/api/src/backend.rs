//! Wires the back-end workers onto a broker.

use broker::{MessageBroker, QueueOptions};
use common::destinations::{CHECK_STOCK, NOTIFICATIONS, PLACE_ORDER, health_check_for};
use tokio::task::JoinHandle;
use workers::{
    HealthCheck, HealthResponder, InMemoryNotificationSink, NotificationWorker, OrderBook,
    OrderPlacementWorker, StockLedger, StockResponder,
};

/// Services the gateway checks on `GET /health`.
pub const MONITORED_SERVICES: [&str; 3] = [
    workers::stock::SERVICE_NAME,
    workers::orders::SERVICE_NAME,
    workers::notifications::SERVICE_NAME,
];

/// Handles to a running set of workers.
pub struct Backend {
    pub orders: OrderBook,
    pub notifications: InMemoryNotificationSink,
    pub handles: Vec<JoinHandle<workers::Result<()>>>,
}

impl Backend {
    /// Stops every worker task.
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Spawns one of each worker plus a health responder per service.
///
/// Every worker destination is declared before this returns, so nothing
/// published afterwards is lost while the workers attach. The stock
/// responder and the order-placement worker share `ledger`, so placed
/// orders are reflected in later stock checks.
pub async fn start_workers<B, L>(broker: B, ledger: L) -> broker::Result<Backend>
where
    B: MessageBroker + Clone + 'static,
    L: StockLedger + HealthCheck + Clone + 'static,
{
    for queue in [CHECK_STOCK, PLACE_ORDER, NOTIFICATIONS] {
        broker.declare(queue, QueueOptions::durable()).await?;
    }
    for service in MONITORED_SERVICES {
        broker
            .declare(&health_check_for(service), QueueOptions::durable())
            .await?;
    }

    let orders = OrderBook::new();
    let notifications = InMemoryNotificationSink::new();
    let mut handles = Vec::new();

    let stock = StockResponder::new(broker.clone(), ledger.clone());
    handles.push(tokio::spawn(async move { stock.run().await }));

    let placement = OrderPlacementWorker::new(broker.clone(), ledger.clone(), orders.clone());
    handles.push(tokio::spawn(async move { placement.run().await }));

    let notifier = NotificationWorker::new(broker.clone(), notifications.clone());
    handles.push(tokio::spawn(async move { notifier.run().await }));

    let inventory_health =
        HealthResponder::new(broker.clone(), workers::stock::SERVICE_NAME, ledger.clone());
    handles.push(tokio::spawn(async move { inventory_health.run().await }));

    let orders_health = HealthResponder::new(broker.clone(), workers::orders::SERVICE_NAME, ledger);
    handles.push(tokio::spawn(async move { orders_health.run().await }));

    let notifications_health = HealthResponder::new(
        broker,
        workers::notifications::SERVICE_NAME,
        notifications.clone(),
    );
    handles.push(tokio::spawn(async move { notifications_health.run().await }));

    tracing::info!(workers = handles.len(), "back-end workers started");

    Ok(Backend {
        orders,
        notifications,
        handles,
    })
}
