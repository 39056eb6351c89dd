//! Stock responder: answers `check_stock` requests.

use async_trait::async_trait;
use broker::{Message, MessageBroker};
use common::destinations::CHECK_STOCK;
use common::{StockCheckReply, StockCheckRequest};

use crate::Result;
use crate::consumer::{QueueWorker, run_worker};
use crate::ledger::{StockLedger, is_available};

/// Service name used in health reports.
pub const SERVICE_NAME: &str = "inventory";

/// What became of one stock-check request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockCheckOutcome {
    /// A reply was published.
    Replied(StockCheckReply),
    /// The reply was computed but publishing it failed.
    ReplyFailed(StockCheckReply),
    /// Nothing was sent; the requester will time out.
    Dropped(&'static str),
}

/// Answers each stock-check request with exactly one reply.
///
/// Evaluation is a pure read of the ledger, so a redelivered request gets
/// an equivalent answer.
#[derive(Clone)]
pub struct StockResponder<B, L> {
    broker: B,
    ledger: L,
}

impl<B, L> StockResponder<B, L>
where
    B: MessageBroker,
    L: StockLedger,
{
    pub fn new(broker: B, ledger: L) -> Self {
        Self { broker, ledger }
    }

    /// Consumes `check_stock` until the broker goes away.
    pub async fn run(&self) -> Result<()> {
        run_worker(&self.broker, self).await
    }

    /// Answers a single request.
    #[tracing::instrument(skip(self, message), fields(correlation_id = ?message.correlation_id))]
    pub async fn handle(&self, message: &Message) -> StockCheckOutcome {
        let request: StockCheckRequest = match message.decode() {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    body = %message.body_lossy(),
                    "malformed stock request dropped"
                );
                metrics::counter!("stock_requests_dropped_total").increment(1);
                return StockCheckOutcome::Dropped("malformed body");
            }
        };

        if message.correlation_id.is_none() {
            tracing::warn!("stock request without correlation token dropped");
            metrics::counter!("stock_requests_dropped_total").increment(1);
            return StockCheckOutcome::Dropped("missing correlation token");
        }

        let reply = StockCheckReply {
            product_id: request.product_id,
            is_available: self.evaluate(&request).await,
        };

        let outbound = match message.reply_with(&reply) {
            Some(Ok(outbound)) => outbound,
            Some(Err(e)) => {
                tracing::error!(error = %e, "failed to encode stock reply");
                return StockCheckOutcome::ReplyFailed(reply);
            }
            None => {
                tracing::warn!("stock request without reply address dropped");
                metrics::counter!("stock_requests_dropped_total").increment(1);
                return StockCheckOutcome::Dropped("missing reply address");
            }
        };

        match self.broker.publish(outbound).await {
            Ok(()) => {
                tracing::debug!(
                    product_id = reply.product_id,
                    is_available = reply.is_available,
                    "stock reply sent"
                );
                metrics::counter!("stock_replies_total").increment(1);
                StockCheckOutcome::Replied(reply)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to publish stock reply");
                StockCheckOutcome::ReplyFailed(reply)
            }
        }
    }

    /// Unknown products are unavailable. A ledger failure is also answered
    /// as unavailable, since availability could not be shown.
    async fn evaluate(&self, request: &StockCheckRequest) -> bool {
        match self.ledger.on_hand(request.product_id).await {
            Ok(on_hand) => is_available(on_hand, request.quantity),
            Err(e) => {
                tracing::error!(product_id = request.product_id, error = %e, "stock lookup failed");
                false
            }
        }
    }
}

#[async_trait]
impl<B, L> QueueWorker for StockResponder<B, L>
where
    B: MessageBroker,
    L: StockLedger,
{
    fn queue(&self) -> &str {
        CHECK_STOCK
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
    use common::CorrelationToken;

    async fn setup() -> (
        StockResponder<InMemoryBroker, InMemoryStockLedger>,
        InMemoryBroker,
        InMemoryStockLedger,
    ) {
        let broker = InMemoryBroker::new();
        let ledger = InMemoryStockLedger::seeded();
        (
            StockResponder::new(broker.clone(), ledger.clone()),
            broker,
            ledger,
        )
    }

    async fn request_with_reply_queue(
        broker: &InMemoryBroker,
        body: &StockCheckRequest,
    ) -> (Message, broker::ReplyQueue) {
        let replies = broker.open_reply_queue().await.unwrap();
        let message = Message::builder(CHECK_STOCK)
            .correlation_id(CorrelationToken::new())
            .reply_to(replies.address().clone())
            .json(body)
            .unwrap()
            .build();
        (message, replies)
    }

    #[tokio::test]
    async fn available_stock_is_reported() {
        let (responder, broker, _) = setup().await;
        let (request, mut replies) = request_with_reply_queue(
            &broker,
            &StockCheckRequest {
                product_id: 101,
                quantity: 3,
            },
        )
        .await;

        let outcome = responder.handle(&request).await;
        assert_eq!(
            outcome,
            StockCheckOutcome::Replied(StockCheckReply {
                product_id: 101,
                is_available: true
            })
        );

        let reply = replies.next_reply().await.unwrap();
        assert_eq!(reply.correlation_id, request.correlation_id);
        let body: StockCheckReply = reply.decode().unwrap();
        assert!(body.is_available);
    }

    #[tokio::test]
    async fn insufficient_and_unknown_stock_are_unavailable() {
        let (responder, broker, _) = setup().await;

        for (product_id, quantity) in [(101, 11), (103, 1), (999, 1)] {
            let (request, _replies) =
                request_with_reply_queue(&broker, &StockCheckRequest { product_id, quantity })
                    .await;
            let outcome = responder.handle(&request).await;
            assert_eq!(
                outcome,
                StockCheckOutcome::Replied(StockCheckReply {
                    product_id,
                    is_available: false
                })
            );
        }
    }

    #[tokio::test]
    async fn redelivery_gets_an_equivalent_reply() {
        let (responder, broker, _) = setup().await;
        let (request, mut replies) = request_with_reply_queue(
            &broker,
            &StockCheckRequest {
                product_id: 102,
                quantity: 5,
            },
        )
        .await;

        let first = responder.handle(&request).await;
        let second = responder.handle(&request).await;
        assert_eq!(first, second);

        let a: StockCheckReply = replies.next_reply().await.unwrap().decode().unwrap();
        let b: StockCheckReply = replies.next_reply().await.unwrap().decode().unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn malformed_request_is_dropped_without_reply() {
        let (responder, broker, _) = setup().await;
        let replies = broker.open_reply_queue().await.unwrap();
        let request = Message::builder(CHECK_STOCK)
            .correlation_id(CorrelationToken::new())
            .reply_to(replies.address().clone())
            .raw("application/json", "{not json")
            .build();

        let outcome = responder.handle(&request).await;
        assert_eq!(outcome, StockCheckOutcome::Dropped("malformed body"));
    }

    #[tokio::test]
    async fn request_without_reply_address_is_dropped() {
        let (responder, _, _) = setup().await;
        let request = Message::builder(CHECK_STOCK)
            .correlation_id(CorrelationToken::new())
            .json(&StockCheckRequest {
                product_id: 101,
                quantity: 1,
            })
            .unwrap()
            .build();

        let outcome = responder.handle(&request).await;
        assert_eq!(outcome, StockCheckOutcome::Dropped("missing reply address"));
    }

    #[tokio::test]
    async fn ledger_failure_answers_unavailable() {
        let (responder, broker, ledger) = setup().await;
        ledger.set_offline(true);
        let (request, _replies) = request_with_reply_queue(
            &broker,
            &StockCheckRequest {
                product_id: 101,
                quantity: 1,
            },
        )
        .await;

        let outcome = responder.handle(&request).await;
        assert_eq!(
            outcome,
            StockCheckOutcome::Replied(StockCheckReply {
                product_id: 101,
                is_available: false
            })
        );
    }

    #[tokio::test]
    async fn reply_publish_failure_is_reported_not_raised() {
        let (responder, broker, _) = setup().await;
        let (request, replies) = request_with_reply_queue(
            &broker,
            &StockCheckRequest {
                product_id: 101,
                quantity: 1,
            },
        )
        .await;
        broker.fail_publishes_to(replies.address().as_str());

        let outcome = responder.handle(&request).await;
        assert!(matches!(outcome, StockCheckOutcome::ReplyFailed(_)));
    }

    #[tokio::test]
    async fn loop_survives_bad_messages() {
        let (responder, broker, _) = setup().await;
        let worker = tokio::spawn({
            let responder = responder.clone();
            async move { responder.run().await }
        });

        // Wait for the worker to attach before publishing.
        while broker.consumer_count(CHECK_STOCK) == 0 {
            tokio::task::yield_now().await;
        }

        let garbage = Message::builder(CHECK_STOCK)
            .raw("text/plain", "garbage")
            .build();
        broker.publish(garbage).await.unwrap();

        let (request, mut replies) = request_with_reply_queue(
            &broker,
            &StockCheckRequest {
                product_id: 101,
                quantity: 1,
            },
        )
        .await;
        broker.publish(request).await.unwrap();
        assert!(replies.next_reply().await.is_some());

        broker.close();
        assert!(worker.await.unwrap().is_ok());
    }
}
