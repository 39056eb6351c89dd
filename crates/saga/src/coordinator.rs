//! Saga coordinator for order processing.

use std::time::Instant;

use broker::{MessageBroker, MessageBrokerExt, ReplyWaiter};
use common::destinations::{CHECK_STOCK, NOTIFICATIONS, PLACE_ORDER};
use common::{Notification, OrderRequest, StockCheckReply};

use crate::error::SagaError;
use crate::order_fulfillment::{self, SagaConfig};
use crate::outcome::{OrderConfirmation, SagaOutcome, StockRejection};
use crate::state::SagaStage;

/// Drives one order through check stock → place order → notify.
///
/// The coordinator holds no per-order state, so one instance (or clones of
/// it) can run any number of sagas concurrently. Each stock check gets its
/// own correlation token and reply destination from the [`ReplyWaiter`].
#[derive(Clone)]
pub struct SagaCoordinator<B> {
    broker: B,
    waiter: ReplyWaiter<B>,
    config: SagaConfig,
}

impl<B> SagaCoordinator<B>
where
    B: MessageBroker + Clone,
{
    /// Creates a coordinator with the default configuration.
    pub fn new(broker: B) -> Self {
        Self::with_config(broker, SagaConfig::default())
    }

    pub fn with_config(broker: B, config: SagaConfig) -> Self {
        Self {
            waiter: ReplyWaiter::new(broker.clone()),
            broker,
            config,
        }
    }

    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Runs the saga for one order.
    ///
    /// Returns `Ok` for both a completed order and a stock rejection; every
    /// other ending is a [`SagaError`] naming the stage that failed.
    #[tracing::instrument(
        skip(self),
        fields(saga_type = order_fulfillment::SAGA_TYPE, order_id = request.order_id)
    )]
    pub async fn execute(&self, request: OrderRequest) -> Result<SagaOutcome, SagaError> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = Instant::now();

        let result = self.run_steps(request).await;

        metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        match &result {
            Ok(SagaOutcome::Completed(_)) => {
                metrics::counter!("saga_completed").increment(1);
                tracing::info!(stage = %SagaStage::Completed, "saga completed successfully");
            }
            Ok(SagaOutcome::StockUnavailable(_)) => {
                metrics::counter!("saga_rejected").increment(1);
                tracing::info!(stage = %SagaStage::Rejected, "saga rejected: insufficient stock");
            }
            Err(e) => {
                metrics::counter!("saga_failed", "stage" => e.stage().as_str()).increment(1);
                tracing::warn!(stage = %e.stage(), error = %e, "saga failed");
                if e.reached_broker() && self.config.notify_on_rejection {
                    self.publish_notification(&Notification::internal_error(request.user_id))
                        .await;
                }
            }
        }
        result
    }

    async fn run_steps(&self, request: OrderRequest) -> Result<SagaOutcome, SagaError> {
        request.validate()?;

        // 1. Check stock
        tracing::info!(step = order_fulfillment::STEP_CHECK_STOCK, "saga step started");
        let stock_check: StockCheckReply = self
            .waiter
            .call(
                CHECK_STOCK,
                &request.stock_check(),
                self.config.stock_check_timeout,
            )
            .await?;

        if !stock_check.is_available {
            let notification = self.notify_rejection(&request).await;
            return Ok(SagaOutcome::StockUnavailable(StockRejection {
                order_id: request.order_id,
                quantity: request.quantity,
                stock_check,
                notification,
            }));
        }

        // 2. Place order. Stock was only checked, so there is nothing to undo.
        tracing::info!(step = order_fulfillment::STEP_PLACE_ORDER, "saga step started");
        self.broker
            .publish_json(PLACE_ORDER, &request.to_order())
            .await
            .map_err(SagaError::OrderPlacement)?;

        // 3. Notify. Past the point of no return: failures are only logged.
        tracing::info!(step = order_fulfillment::STEP_NOTIFY, "saga step started");
        let notification = Notification::order_placed(request.user_id);
        let notification_delivered = self.publish_notification(&notification).await;

        Ok(SagaOutcome::Completed(OrderConfirmation {
            order_id: request.order_id,
            status: order_fulfillment::STATUS_PROCESSED.to_string(),
            quantity: request.quantity,
            stock_check,
            notification,
            notification_delivered,
        }))
    }

    async fn notify_rejection(&self, request: &OrderRequest) -> Option<Notification> {
        if !self.config.notify_on_rejection {
            return None;
        }
        let notification = Notification::stock_unavailable(request.user_id, request.product_id);
        self.publish_notification(&notification)
            .await
            .then_some(notification)
    }

    async fn publish_notification(&self, notification: &Notification) -> bool {
        match self.broker.publish_json(NOTIFICATIONS, notification).await {
            Ok(()) => true,
            Err(e) => {
                metrics::counter!("saga_notification_failures_total").increment(1);
                tracing::error!(
                    user_id = notification.user_id,
                    error = %e,
                    "failed to publish notification"
                );
                false
            }
        }
    }
}
