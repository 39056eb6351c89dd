//! Message channel abstraction and the request/reply bridge built on it.
//!
//! The gateway talks to its workers only through queues. This crate
//! provides:
//! - [`MessageBroker`]: declare, publish, subscribe, private reply queues
//! - [`InMemoryBroker`]: an in-process broker with AMQP-like semantics
//! - [`ReplyWaiter`]: one request, one correlated reply, or a timeout
//! - [`FanOut`]: scatter a request and gather the replies within a window

pub mod broker;
pub mod error;
pub mod fan_out;
pub mod memory;
pub mod message;
pub mod reply;
pub mod rpc;

pub use broker::{MessageBroker, MessageBrokerExt, MessageStream, QueueOptions};
pub use error::{BrokerError, Result};
pub use fan_out::FanOut;
pub use memory::InMemoryBroker;
pub use message::{JSON_CONTENT_TYPE, Message, MessageBuilder, MessageId};
pub use reply::ReplyQueue;
pub use rpc::{ReplyWaiter, RpcError};
