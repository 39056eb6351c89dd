//! Broadcast a request to several destinations and gather whatever answers.

use std::time::Duration;

use serde::Serialize;

use crate::broker::MessageBroker;
use crate::message::Message;
use crate::rpc::RpcError;
use crate::BrokerError;

/// Scatter/gather over one shared reply destination.
///
/// Unlike [`ReplyWaiter`](crate::ReplyWaiter) there is no correlation
/// strictness: every message landing on the reply destination within the
/// window is collected.
#[derive(Clone)]
pub struct FanOut<B> {
    broker: B,
}

impl<B: MessageBroker> FanOut<B> {
    pub fn new(broker: B) -> Self {
        Self { broker }
    }

    /// Publishes `request` to every destination and collects replies until
    /// one per destination has arrived or `window` elapses.
    #[tracing::instrument(skip(self, request))]
    pub async fn gather<T: Serialize + Sync>(
        &self,
        destinations: &[String],
        request: &T,
        window: Duration,
    ) -> Result<Vec<Message>, RpcError> {
        let mut replies = self.broker.open_reply_queue().await?;

        for destination in destinations {
            let message = Message::builder(destination.as_str())
                .reply_to(replies.address().clone())
                .json(request)
                .map_err(BrokerError::from)?
                .build();
            self.broker.publish(message).await?;
        }

        let deadline = tokio::time::Instant::now() + window;
        let mut collected = Vec::with_capacity(destinations.len());
        while collected.len() < destinations.len() {
            match tokio::time::timeout_at(deadline, replies.next_reply()).await {
                Ok(Some(reply)) => collected.push(reply),
                Ok(None) => return Err(RpcError::Transport(BrokerError::ConnectionClosed)),
                Err(_) => {
                    tracing::debug!(
                        expected = destinations.len(),
                        received = collected.len(),
                        "fan-out window elapsed"
                    );
                    break;
                }
            }
        }

        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::QueueOptions;
    use crate::memory::InMemoryBroker;
    use futures_util::StreamExt;

    async fn spawn_echo(broker: &InMemoryBroker, queue: &str) {
        broker.declare(queue, QueueOptions::durable()).await.unwrap();
        let mut requests = broker.subscribe(queue).await.unwrap();
        let name = queue.to_string();
        let broker = broker.clone();
        tokio::spawn(async move {
            while let Some(request) = requests.next().await {
                let reply = request.reply_with(&name).unwrap().unwrap();
                broker.publish(reply).await.unwrap();
            }
        });
    }

    #[tokio::test]
    async fn gathers_one_reply_per_destination() {
        let broker = InMemoryBroker::new();
        spawn_echo(&broker, "a").await;
        spawn_echo(&broker, "b").await;

        let fan_out = FanOut::new(broker);
        let replies = fan_out
            .gather(
                &["a".to_string(), "b".to_string()],
                &"ping",
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        let mut names: Vec<String> = replies.iter().map(|r| r.decode().unwrap()).collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_destinations_are_left_out() {
        let broker = InMemoryBroker::new();
        spawn_echo(&broker, "a").await;
        broker
            .declare("silent", QueueOptions::durable())
            .await
            .unwrap();

        let fan_out = FanOut::new(broker);
        let replies = fan_out
            .gather(
                &["a".to_string(), "silent".to_string()],
                &"ping",
                Duration::from_millis(100),
            )
            .await
            .unwrap();

        assert_eq!(replies.len(), 1);
    }
}
