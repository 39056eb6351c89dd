//! Notification worker: consumes `notifications`.

use std::sync::Arc;

use async_trait::async_trait;
use broker::{Message, MessageBroker};
use common::Notification;
use common::destinations::NOTIFICATIONS;
use tokio::sync::RwLock;

use crate::Result;
use crate::consumer::{QueueWorker, run_worker};
use crate::ledger::HealthCheck;

/// Service name used in health reports.
pub const SERVICE_NAME: &str = "notifications";

/// Delivery channel for user notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// Sink that logs each notification and keeps it for inspection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationSink {
    delivered: Arc<RwLock<Vec<Notification>>>,
}

impl InMemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications delivered so far, oldest first.
    pub async fn delivered(&self) -> Vec<Notification> {
        self.delivered.read().await.clone()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        tracing::info!(
            user_id = notification.user_id,
            message = %notification.message,
            "notification sent"
        );
        self.delivered.write().await.push(notification.clone());
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for InMemoryNotificationSink {
    async fn check_health(&self) -> Result<()> {
        Ok(())
    }
}

/// What became of one `notifications` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Delivered(Notification),
    Failed(Notification),
    Dropped(&'static str),
}

/// Hands every notification to its sink. Delivery is best-effort.
#[derive(Clone)]
pub struct NotificationWorker<B, S> {
    broker: B,
    sink: S,
}

impl<B, S> NotificationWorker<B, S>
where
    B: MessageBroker,
    S: NotificationSink,
{
    pub fn new(broker: B, sink: S) -> Self {
        Self { broker, sink }
    }

    /// Consumes `notifications` until the broker goes away.
    pub async fn run(&self) -> Result<()> {
        run_worker(&self.broker, self).await
    }

    pub async fn handle(&self, message: &Message) -> NotificationOutcome {
        let notification: Notification = match message.decode() {
            Ok(notification) => notification,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    body = %message.body_lossy(),
                    "malformed notification dropped"
                );
                return NotificationOutcome::Dropped("malformed body");
            }
        };

        match self.sink.deliver(&notification).await {
            Ok(()) => {
                metrics::counter!("notifications_delivered_total").increment(1);
                NotificationOutcome::Delivered(notification)
            }
            Err(e) => {
                tracing::error!(
                    user_id = notification.user_id,
                    error = %e,
                    "notification delivery failed"
                );
                NotificationOutcome::Failed(notification)
            }
        }
    }
}

#[async_trait]
impl<B, S> QueueWorker for NotificationWorker<B, S>
where
    B: MessageBroker,
    S: NotificationSink,
{
    fn queue(&self) -> &str {
        NOTIFICATIONS
    }

    async fn handle_message(&self, message: Message) {
        self.handle(&message).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker::InMemoryBroker;

    #[tokio::test]
    async fn notification_is_delivered_to_sink() {
        let sink = InMemoryNotificationSink::new();
        let worker = NotificationWorker::new(InMemoryBroker::new(), sink.clone());
        let message = Message::builder(NOTIFICATIONS)
            .json(&Notification::order_placed(7))
            .unwrap()
            .build();

        let outcome = worker.handle(&message).await;

        assert_eq!(
            outcome,
            NotificationOutcome::Delivered(Notification::order_placed(7))
        );
        assert_eq!(sink.delivered().await, vec![Notification::order_placed(7)]);
    }

    #[tokio::test]
    async fn malformed_notification_is_dropped() {
        let sink = InMemoryNotificationSink::new();
        let worker = NotificationWorker::new(InMemoryBroker::new(), sink.clone());
        let message = Message::builder(NOTIFICATIONS)
            .raw("application/json", r#"{"user_id":"seven"}"#)
            .build();

        assert_eq!(
            worker.handle(&message).await,
            NotificationOutcome::Dropped("malformed body")
        );
        assert!(sink.delivered().await.is_empty());
    }
}
