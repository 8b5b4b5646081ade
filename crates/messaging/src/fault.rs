//! Structured fault replies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A remote service's explicit refusal of a request.
///
/// Travels on a channel distinct from success replies so callers can tell
/// "the remote rejected this" apart from "the remote never answered". The
/// code and message are copied verbatim from the remote failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct Fault {
    /// Machine-readable error code (see `contracts::error_codes`).
    pub code: String,
    /// Human-readable reason from the remote service.
    pub message: String,
}

impl Fault {
    /// Creates a fault with the given code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_message() {
        let fault = Fault::new("USER_NOT_FOUND", "no such user");
        assert_eq!(fault.to_string(), "USER_NOT_FOUND: no such user");
    }

    #[test]
    fn serialization_roundtrip() {
        let fault = Fault::new("DUPLICATE_RESOURCE", "email already registered");
        let json = serde_json::to_string(&fault).unwrap();
        let deserialized: Fault = serde_json::from_str(&json).unwrap();
        assert_eq!(fault, deserialized);
    }
}
