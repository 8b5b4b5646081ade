//! Shared identifier types used across the onboarding platform.

mod types;

pub use types::{AuthUserId, CorrelationId, RequestId, UserId};
