use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use common::ReplyAddress;
use futures_util::stream;
use tokio::sync::mpsc;

use crate::broker::{MessageBroker, MessageStream, QueueOptions};
use crate::message::Message;
use crate::reply::ReplyQueue;
use crate::{BrokerError, Result};

struct ConsumerSlot {
    id: u64,
    sender: mpsc::UnboundedSender<Message>,
}

/// Messages wait in `backlog` until a consumer is attached, then are
/// handed out round-robin, each to exactly one consumer's own channel.
struct Queue {
    options: QueueOptions,
    backlog: VecDeque<Message>,
    consumers: Vec<ConsumerSlot>,
    next_consumer: usize,
}

impl Queue {
    fn new(options: QueueOptions) -> Self {
        Self {
            options,
            backlog: VecDeque::new(),
            consumers: Vec::new(),
            next_consumer: 0,
        }
    }

    fn deliver(&mut self, mut message: Message) {
        while !self.consumers.is_empty() {
            let index = self.next_consumer % self.consumers.len();
            self.next_consumer = index + 1;
            match self.consumers[index].sender.send(message) {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    self.consumers.remove(index);
                    message = returned;
                }
            }
        }
        self.backlog.push_back(message);
    }

    fn attach(&mut self, id: u64) -> mpsc::UnboundedReceiver<Message> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.consumers.push(ConsumerSlot { id, sender });
        for message in std::mem::take(&mut self.backlog) {
            self.deliver(message);
        }
        receiver
    }
}

#[derive(Default)]
struct BrokerState {
    queues: HashMap<String, Queue>,
    closed: bool,
    failing: HashSet<String>,
    journal: Option<Vec<Message>>,
    next_consumer_id: u64,
}

/// In-process broker with AMQP-like queue semantics.
///
/// Each destination is a FIFO. Consumers of one destination compete for
/// its messages: each message is pushed to exactly one of them, and
/// whatever a consumer had not taken when it detaches goes back to the
/// others. Private queues are removed as soon as their consumer detaches,
/// and anything later published to them is dropped.
///
/// All state sits behind a single lock and a publish is one enqueue, so
/// clones of the broker can be used from any number of tasks. No lock is
/// held while a consumer waits, so abandoning a pending `next()` never
/// blocks the other consumers.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    /// Creates an empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a broker that keeps a copy of every accepted publish.
    pub fn recording() -> Self {
        let broker = Self::default();
        broker.lock().journal = Some(Vec::new());
        broker
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulates losing the connection: every queue is torn down, open
    /// consumers see their streams end, and further calls fail.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.queues.clear();
        tracing::warn!("in-memory broker closed");
    }

    /// Makes every publish to `destination` fail until cleared.
    pub fn fail_publishes_to(&self, destination: &str) {
        self.lock().failing.insert(destination.to_string());
    }

    /// Clears a failure injected with [`fail_publishes_to`](Self::fail_publishes_to).
    pub fn clear_publish_failures(&self) {
        self.lock().failing.clear();
    }

    /// Returns true if the destination currently exists.
    pub fn queue_exists(&self, name: &str) -> bool {
        self.lock().queues.contains_key(name)
    }

    /// Number of consumers attached to a destination.
    pub fn consumer_count(&self, name: &str) -> usize {
        self.lock().queues.get(name).map_or(0, |q| q.consumers.len())
    }

    /// Number of destinations that currently exist.
    pub fn queue_count(&self) -> usize {
        self.lock().queues.len()
    }

    /// Messages accepted for `destination`, in publish order.
    ///
    /// Always empty unless the broker was created with [`recording`](Self::recording).
    pub fn published_to(&self, destination: &str) -> Vec<Message> {
        self.lock()
            .journal
            .as_ref()
            .map(|journal| {
                journal
                    .iter()
                    .filter(|m| m.destination == destination)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn attach(&self, name: &str) -> Result<Consumer> {
        let mut state = self.lock();
        if state.closed {
            return Err(BrokerError::ConnectionClosed);
        }
        let id = state.next_consumer_id;
        let queue = state
            .queues
            .get_mut(name)
            .ok_or_else(|| BrokerError::QueueNotFound(name.to_string()))?;
        if queue.options.exclusive && !queue.consumers.is_empty() {
            return Err(BrokerError::ExclusiveQueueInUse(name.to_string()));
        }
        let receiver = queue.attach(id);
        state.next_consumer_id += 1;
        Ok(Consumer {
            queue: name.to_string(),
            id,
            receiver,
            state: Arc::downgrade(&self.state),
        })
    }
}

/// Detaches a consumer when its stream is dropped.
struct Consumer {
    queue: String,
    id: u64,
    receiver: mpsc::UnboundedReceiver<Message>,
    state: Weak<Mutex<BrokerState>>,
}

impl Drop for Consumer {
    fn drop(&mut self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(queue) = state.queues.get_mut(&self.queue) else {
            return;
        };
        queue.consumers.retain(|slot| slot.id != self.id);

        if queue.options.auto_delete && queue.consumers.is_empty() {
            state.queues.remove(&self.queue);
            tracing::debug!(queue = %self.queue, "auto-delete queue torn down");
            return;
        }

        // Undelivered messages go back to the remaining consumers.
        self.receiver.close();
        while let Ok(message) = self.receiver.try_recv() {
            queue.deliver(message);
        }
    }
}

fn consume(consumer: Consumer) -> MessageStream {
    Box::pin(stream::unfold(consumer, |mut consumer| async move {
        let message = consumer.receiver.recv().await?;
        metrics::counter!("broker_messages_delivered_total").increment(1);
        Some((message, consumer))
    }))
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn declare(&self, name: &str, options: QueueOptions) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(BrokerError::ConnectionClosed);
        }
        state
            .queues
            .entry(name.to_string())
            .or_insert_with(|| Queue::new(options));
        Ok(())
    }

    async fn publish(&self, message: Message) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(BrokerError::ConnectionClosed);
        }
        if state.failing.contains(&message.destination) {
            metrics::counter!("broker_publish_failures_total").increment(1);
            return Err(BrokerError::PublishFailed {
                destination: message.destination,
                reason: "publish rejected by broker".to_string(),
            });
        }

        if let Some(journal) = state.journal.as_mut() {
            journal.push(message.clone());
        }

        match state.queues.get_mut(&message.destination) {
            Some(queue) => {
                queue.deliver(message);
                metrics::counter!("broker_messages_published_total").increment(1);
            }
            None => {
                tracing::debug!(
                    destination = %message.destination,
                    message_id = %message.message_id,
                    "no such destination, message dropped"
                );
                metrics::counter!("broker_messages_unroutable_total").increment(1);
            }
        }
        Ok(())
    }

    async fn subscribe(&self, name: &str) -> Result<MessageStream> {
        Ok(consume(self.attach(name)?))
    }

    async fn open_reply_queue(&self) -> Result<ReplyQueue> {
        let address = ReplyAddress::generate();
        let name = address.as_str();
        self.declare(name, QueueOptions::private()).await?;
        let deliveries = self.subscribe(name).await?;
        Ok(ReplyQueue::new(address, deliveries))
    }
}
