//! Private, single-consumer reply destinations.

use common::ReplyAddress;
use futures_util::StreamExt;

use crate::broker::MessageStream;
use crate::message::Message;

/// A reply destination owned by exactly one requester.
///
/// The destination exists for as long as this value does. Dropping it
/// detaches the consumer, which lets the broker tear the destination down;
/// anything that arrives afterwards is discarded by the broker.
pub struct ReplyQueue {
    address: ReplyAddress,
    deliveries: MessageStream,
}

impl ReplyQueue {
    /// Pairs a broker-assigned address with the consumer attached to it.
    pub fn new(address: ReplyAddress, deliveries: MessageStream) -> Self {
        Self {
            address,
            deliveries,
        }
    }

    /// The address to put in `reply_to`.
    pub fn address(&self) -> &ReplyAddress {
        &self.address
    }

    /// Waits for the next reply.
    ///
    /// Returns `None` if the destination was torn down underneath us, e.g.
    /// because the broker connection closed.
    pub async fn next_reply(&mut self) -> Option<Message> {
        self.deliveries.next().await
    }
}

impl std::fmt::Debug for ReplyQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyQueue")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
