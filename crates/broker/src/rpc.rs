//! Request/reply over fire-and-forget queues.

use std::time::{Duration, Instant};

use common::CorrelationToken;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::BrokerError;
use crate::broker::MessageBroker;
use crate::message::Message;

/// Ways a [`ReplyWaiter::call`] can fail.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Publishing, subscribing, or the connection itself failed.
    #[error("Transport error: {0}")]
    Transport(#[from] BrokerError),

    /// No reply arrived within the budget.
    #[error("Timed out after {timeout:?} waiting for a reply from '{destination}'")]
    TimedOut {
        destination: String,
        timeout: Duration,
    },

    /// A reply arrived carrying someone else's token.
    #[error("Correlation mismatch: expected {expected}, received {received:?}")]
    CorrelationMismatch {
        expected: CorrelationToken,
        received: Option<CorrelationToken>,
    },

    /// The correlated reply could not be decoded.
    #[error("Malformed reply: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Issues one request and waits for its one reply.
///
/// Every call gets its own correlation token and its own private reply
/// destination, so concurrent calls never see each other's replies and no
/// dispatch table is needed. The reply destination is released when the
/// call returns, whatever the outcome; a reply arriving after that is
/// dropped by the broker.
#[derive(Clone)]
pub struct ReplyWaiter<B> {
    broker: B,
}

impl<B: MessageBroker> ReplyWaiter<B> {
    pub fn new(broker: B) -> Self {
        Self { broker }
    }

    /// Publishes `payload` to `destination` and waits up to `timeout` for a
    /// correctly-correlated reply.
    ///
    /// The first message to arrive decides the call: a foreign token is a
    /// protocol violation and fails immediately instead of waiting on.
    #[tracing::instrument(skip(self, payload), fields(correlation_id = tracing::field::Empty))]
    pub async fn call<Req, Resp>(
        &self,
        destination: &str,
        payload: &Req,
        timeout: Duration,
    ) -> Result<Resp, RpcError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        metrics::counter!("rpc_calls_total").increment(1);
        let started = Instant::now();

        let token = CorrelationToken::new();
        tracing::Span::current().record("correlation_id", tracing::field::display(token));

        let mut replies = self.broker.open_reply_queue().await?;

        let request = Message::builder(destination)
            .correlation_id(token)
            .reply_to(replies.address().clone())
            .json(payload)
            .map_err(BrokerError::from)?
            .build();
        self.broker.publish(request).await?;
        tracing::debug!(reply_to = %replies.address(), "request published, awaiting reply");

        let outcome = tokio::time::timeout(timeout, replies.next_reply()).await;
        metrics::histogram!("rpc_duration_seconds").record(started.elapsed().as_secs_f64());

        let reply = match outcome {
            Err(_) => {
                metrics::counter!("rpc_timeouts_total").increment(1);
                tracing::warn!(?timeout, "no reply before deadline");
                return Err(RpcError::TimedOut {
                    destination: destination.to_string(),
                    timeout,
                });
            }
            Ok(None) => return Err(RpcError::Transport(BrokerError::ConnectionClosed)),
            Ok(Some(reply)) => reply,
        };

        if !token.matches(reply.correlation_id.as_ref()) {
            metrics::counter!("rpc_correlation_mismatches_total").increment(1);
            tracing::error!(
                received = ?reply.correlation_id,
                "reply carries a foreign correlation token"
            );
            return Err(RpcError::CorrelationMismatch {
                expected: token,
                received: reply.correlation_id,
            });
        }

        reply.decode().map_err(RpcError::Decode)
    }
}
