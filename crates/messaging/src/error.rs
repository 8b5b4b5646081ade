//! Messaging error types.

use std::time::Duration;

use thiserror::Error;

use crate::fault::Fault;

/// Error raised while handing a message to the transport.
#[derive(Debug, Clone, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Error raised while publishing a fire-and-forget message.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The transport refused or lost the message.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The message body could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error raised by an RPC-style call.
///
/// Faults and timeouts are distinct variants on purpose: a fault means the
/// remote explicitly rejected the request and retrying is pointless, while
/// a timeout means the remote never answered and the caller may retry if
/// the call is idempotent. Nothing here retries on its own.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The remote rejected the request.
    #[error("request '{kind}' faulted: {fault}")]
    Fault { kind: String, fault: Fault },

    /// No reply arrived within the deadline.
    #[error("request '{kind}' timed out after {timeout:?}")]
    Timeout { kind: String, timeout: Duration },

    /// The transport failed before a reply could arrive.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request body or reply payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RpcError {
    /// Returns true if the call failed because the deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Timeout { .. })
    }

    /// Returns the fault carried by this error, if the remote rejected the
    /// request.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            RpcError::Fault { fault, .. } => Some(fault),
            _ => None,
        }
    }
}

/// Convenience type alias for RPC results.
pub type RpcResult<T> = std::result::Result<T, RpcError>;
