//! Health responder: answers health checks on `health_check.<service>`.

use async_trait::async_trait;
use broker::{Message, MessageBroker};
use common::HealthReport;
use common::destinations::health_check_for;

use crate::Result;
use crate::consumer::{QueueWorker, run_worker};
use crate::ledger::HealthCheck;

/// Replies to each health check with the current health of one service.
#[derive(Clone)]
pub struct HealthResponder<B, P> {
    broker: B,
    service: String,
    queue: String,
    target: P,
}

impl<B, P> HealthResponder<B, P>
where
    B: MessageBroker,
    P: HealthCheck,
{
    pub fn new(broker: B, service: impl Into<String>, target: P) -> Self {
        let service = service.into();
        Self {
            broker,
            queue: health_check_for(&service),
            service,
            target,
        }
    }

    /// Consumes the service's health destination until the broker goes away.
    pub async fn run(&self) -> Result<()> {
        run_worker(&self.broker, self).await
    }

    /// Checks the target and builds the report.
    pub async fn report(&self) -> HealthReport {
        match self.target.check_health().await {
            Ok(()) => HealthReport::healthy(&self.service, "connected"),
            Err(e) => HealthReport::unhealthy(&self.service, e.to_string()),
        }
    }

    /// Answers one health check. Returns the report that was sent, if any.
    pub async fn handle(&self, message: &Message) -> Option<HealthReport> {
        let report = self.report().await;
        let reply = match message.reply_with(&report) {
            Some(Ok(reply)) => reply,
            Some(Err(e)) => {
                tracing::error!(error = %e, "failed to encode health report");
                return None;
            }
            None => {
                tracing::warn!(
                    service = %self.service,
                    "health check without reply address dropped"
                );
                return None;
            }
        };

        if let Err(e) = self.broker.publish(reply).await {
            tracing::error!(service = %self.service, error = %e, "failed to publish health report");
            return None;
        }
        Some(report)
    }
}

#[async_trait]
impl<B, P> QueueWorker for HealthResponder<B, P>
where
    B: MessageBroker,
    P: HealthCheck,
{
    fn queue(&self) -> &str {
        &self.queue
    }

    async fn handle_message(&self, message: Message) {
        self.handle(&message).await;
    }
}
