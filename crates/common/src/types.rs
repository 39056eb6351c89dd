use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque value linking a reply to the request that asked for it.
///
/// A fresh token is generated for every outstanding request, so two
/// concurrent calls can never share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(Uuid);

impl CorrelationToken {
    /// Creates a new random correlation token.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if a reply carrying `received` answers this request.
    ///
    /// A reply without a token never matches.
    pub fn matches(&self, received: Option<&CorrelationToken>) -> bool {
        received == Some(self)
    }
}

impl Default for CorrelationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CorrelationToken {
    type Err = uuid::Error;

    /// Parses a token echoed back as text by a responder.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Address of a destination created to receive the reply for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyAddress(String);

impl ReplyAddress {
    /// Wraps a broker destination name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Generates a broker-style private queue name (`amq.gen-<uuid>`).
    pub fn generate() -> Self {
        Self(format!("amq.gen-{}", Uuid::new_v4().simple()))
    }

    /// Returns the destination name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReplyAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReplyAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
