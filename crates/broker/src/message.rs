use chrono::{DateTime, Utc};
use common::{CorrelationToken, ReplyAddress};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Content type stamped on every JSON body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Unique identifier for a published message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message as it travels through the broker.
///
/// The body is opaque bytes; the routing metadata (destination, reply
/// address, correlation token) travels beside it, the way AMQP carries
/// `reply_to` and `correlation_id` as message properties.
#[derive(Debug, Clone)]
pub struct Message {
    /// Unique identifier for this message.
    pub message_id: MessageId,

    /// Name of the destination the message is routed to.
    pub destination: String,

    /// MIME type of the body.
    pub content_type: String,

    /// Token linking a reply to its request.
    pub correlation_id: Option<CorrelationToken>,

    /// Where the consumer should send its reply, if one is expected.
    pub reply_to: Option<ReplyAddress>,

    /// When the message was created.
    pub timestamp: DateTime<Utc>,

    /// Encoded body.
    pub body: Vec<u8>,
}

impl Message {
    /// Creates a builder for a message routed to `destination`.
    pub fn builder(destination: impl Into<String>) -> MessageBuilder {
        MessageBuilder {
            destination: destination.into(),
            correlation_id: None,
            reply_to: None,
            content_type: JSON_CONTENT_TYPE.to_string(),
            body: Vec::new(),
        }
    }

    /// Builds the reply to this message carrying `payload`.
    ///
    /// Returns `None` when the message has no reply address. The correlation
    /// token is copied verbatim.
    pub fn reply_with<T: Serialize>(
        &self,
        payload: &T,
    ) -> Option<Result<Message, serde_json::Error>> {
        let reply_to = self.reply_to.as_ref()?;
        let mut builder = Message::builder(reply_to.as_str());
        if let Some(token) = self.correlation_id {
            builder = builder.correlation_id(token);
        }
        Some(builder.json(payload).map(MessageBuilder::build))
    }

    /// Decodes the JSON body.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Body as UTF-8 text, for logging malformed messages.
    pub fn body_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Builder for [`Message`].
#[derive(Debug)]
pub struct MessageBuilder {
    destination: String,
    correlation_id: Option<CorrelationToken>,
    reply_to: Option<ReplyAddress>,
    content_type: String,
    body: Vec<u8>,
}

impl MessageBuilder {
    /// Sets the correlation token.
    pub fn correlation_id(mut self, token: CorrelationToken) -> Self {
        self.correlation_id = Some(token);
        self
    }

    /// Sets the reply address.
    pub fn reply_to(mut self, address: ReplyAddress) -> Self {
        self.reply_to = Some(address);
        self
    }

    /// Sets the body from a serializable value.
    pub fn json<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.body = serde_json::to_vec(payload)?;
        self.content_type = JSON_CONTENT_TYPE.to_string();
        Ok(self)
    }

    /// Sets a raw body and its content type.
    pub fn raw(mut self, content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.content_type = content_type.into();
        self.body = body.into();
        self
    }

    /// Builds the message, stamping a fresh ID and the current time.
    pub fn build(self) -> Message {
        Message {
            message_id: MessageId::new(),
            destination: self.destination,
            content_type: self.content_type,
            correlation_id: self.correlation_id,
            reply_to: self.reply_to,
            timestamp: Utc::now(),
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::StockCheckRequest;

    #[test]
    fn builder_sets_routing_metadata() {
        let token = CorrelationToken::new();
        let reply_to = ReplyAddress::generate();

        let message = Message::builder("check_stock")
            .correlation_id(token)
            .reply_to(reply_to.clone())
            .json(&StockCheckRequest {
                product_id: 101,
                quantity: 3,
            })
            .unwrap()
            .build();

        assert_eq!(message.destination, "check_stock");
        assert_eq!(message.correlation_id, Some(token));
        assert_eq!(message.reply_to, Some(reply_to));
        assert_eq!(message.content_type, JSON_CONTENT_TYPE);

        let decoded: StockCheckRequest = message.decode().unwrap();
        assert_eq!(decoded.product_id, 101);
    }

    #[test]
    fn reply_with_echoes_token_and_targets_reply_address() {
        let token = CorrelationToken::new();
        let reply_to = ReplyAddress::generate();
        let request = Message::builder("check_stock")
            .correlation_id(token)
            .reply_to(reply_to.clone())
            .build();

        let reply = request
            .reply_with(&serde_json::json!({"ok": true}))
            .unwrap()
            .unwrap();

        assert_eq!(reply.destination, reply_to.as_str());
        assert_eq!(reply.correlation_id, Some(token));
        assert!(reply.reply_to.is_none());
    }

    #[test]
    fn reply_with_without_reply_address_is_none() {
        let request = Message::builder("check_stock").build();
        assert!(request.reply_with(&1).is_none());
    }

    #[test]
    fn malformed_body_fails_to_decode() {
        let message = Message::builder("check_stock")
            .raw("text/plain", "not json")
            .build();
        assert!(message.decode::<StockCheckRequest>().is_err());
        assert_eq!(message.body_lossy(), "not json");
    }
}
