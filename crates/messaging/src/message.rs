//! Fire-and-forget message envelope and publisher capability.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::PublishError;

/// A message envelope: a wire name plus a JSON payload.
///
/// The transport routes on `kind` and treats the payload as opaque.
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: String,
    pub payload: serde_json::Value,
}

impl Message {
    /// Builds an envelope by serializing the given body.
    pub fn new<T: Serialize>(kind: impl Into<String>, body: &T) -> Result<Self, PublishError> {
        Ok(Self {
            kind: kind.into(),
            payload: serde_json::to_value(body)?,
        })
    }
}

/// Capability to publish messages without awaiting a reply.
///
/// Injected into every component that emits messages; production wiring
/// hands out a broker-backed implementation, tests hand out
/// [`crate::InMemoryBus`].
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes a message. Delivery is at-least-once and unordered across
    /// queues; completion means the transport accepted the message, not
    /// that anyone consumed it.
    async fn publish(&self, message: Message) -> Result<(), PublishError>;
}
