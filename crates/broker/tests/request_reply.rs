//! Integration tests for request/reply over the in-memory broker.

use std::time::Duration;

use broker::{InMemoryBroker, Message, MessageBroker, QueueOptions, ReplyWaiter, RpcError};
use futures_util::StreamExt;
use tokio::sync::mpsc;

const QUEUE: &str = "slow_echo";

/// A responder that holds every request until the test releases it, then
/// answers with the request body.
async fn spawn_gated_responder(broker: &InMemoryBroker) -> mpsc::UnboundedSender<()> {
    broker
        .declare(QUEUE, QueueOptions::durable())
        .await
        .unwrap();
    let mut requests = broker.subscribe(QUEUE).await.unwrap();
    let (release, mut gate) = mpsc::unbounded_channel::<()>();
    let broker = broker.clone();
    tokio::spawn(async move {
        while let Some(request) = requests.next().await {
            if gate.recv().await.is_none() {
                return;
            }
            let body: String = request.decode().unwrap();
            let reply = request.reply_with(&body).unwrap().unwrap();
            broker.publish(reply).await.unwrap();
        }
    });
    release
}

#[tokio::test]
async fn late_reply_is_not_delivered_to_the_next_call() {
    let broker = InMemoryBroker::new();
    let release = spawn_gated_responder(&broker).await;
    let waiter = ReplyWaiter::new(broker.clone());

    let first: Result<String, _> = waiter
        .call(QUEUE, &"first", Duration::from_millis(50))
        .await;
    assert!(matches!(first, Err(RpcError::TimedOut { .. })));

    // Let the responder answer the abandoned request, then the new one.
    release.send(()).unwrap();
    release.send(()).unwrap();

    let second: String = waiter
        .call(QUEUE, &"second", Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(second, "second");
}

#[tokio::test]
async fn duplicate_reply_is_ignored_after_the_first() {
    let broker = InMemoryBroker::new();
    broker
        .declare(QUEUE, QueueOptions::durable())
        .await
        .unwrap();
    let mut requests = broker.subscribe(QUEUE).await.unwrap();
    let responder = broker.clone();
    tokio::spawn(async move {
        while let Some(request) = requests.next().await {
            for n in [1, 2] {
                let reply = request.reply_with(&n).unwrap().unwrap();
                responder.publish(reply).await.unwrap();
            }
        }
    });

    let waiter = ReplyWaiter::new(broker.clone());
    let reply: i32 = waiter
        .call(QUEUE, &"ping", Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(reply, 1);
}

#[tokio::test]
async fn request_carries_token_and_private_reply_address() {
    let broker = InMemoryBroker::recording();
    broker
        .declare(QUEUE, QueueOptions::durable())
        .await
        .unwrap();
    let mut requests = broker.subscribe(QUEUE).await.unwrap();
    let responder = broker.clone();
    let seen = tokio::spawn(async move {
        let request = requests.next().await.unwrap();
        let reply = request.reply_with(&"ok").unwrap().unwrap();
        responder.publish(reply).await.unwrap();
        request
    });

    let waiter = ReplyWaiter::new(broker.clone());
    let _: String = waiter
        .call(QUEUE, &"ping", Duration::from_secs(1))
        .await
        .unwrap();

    let request: Message = seen.await.unwrap();
    assert!(request.correlation_id.is_some());
    let reply_to = request.reply_to.unwrap();
    assert!(reply_to.as_str().starts_with("amq.gen-"));
    assert!(!broker.queue_exists(reply_to.as_str()));
}
