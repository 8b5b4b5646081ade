//! Saga error types.

use common::CorrelationId;
use messaging::{PublishError, RpcError};
use thiserror::Error;

/// Errors raised by saga instance stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A non-terminal instance already exists for this email.
    #[error("an active onboarding already exists for {email}")]
    ActiveOnboardingExists { email: String },

    /// The instance to update does not exist.
    #[error("saga instance not found: {0}")]
    NotFound(CorrelationId),

    /// A stored state column holds a value the enum does not know.
    #[error("invalid state value in store: {0}")]
    InvalidState(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors raised by the orchestration engine.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A start request arrived while an instance for the same email is
    /// still in flight.
    #[error("onboarding already in progress for {email}")]
    OnboardingInProgress { email: String },

    /// Instance store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A command could not be published.
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),
}

/// Errors raised by the directory aggregation.
///
/// Only the primary call can fail the aggregate; auxiliary sub-call
/// failures are masked with defaults and never surface here.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The single-user lookup failed.
    #[error("user lookup failed: {0}")]
    UserLookup(#[source] RpcError),

    /// The user listing failed.
    #[error("user listing failed: {0}")]
    UserListing(#[source] RpcError),
}

/// The step at which an account deletion stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStep {
    Lookup,
    Credentials,
    Profile,
}

impl std::fmt::Display for DeletionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeletionStep::Lookup => "lookup",
            DeletionStep::Credentials => "credentials",
            DeletionStep::Profile => "profile",
        };
        write!(f, "{name}")
    }
}

/// Errors raised by the account deletion workflow.
#[derive(Debug, Error)]
pub enum DeletionError {
    /// The profile lookup failed; nothing was deleted.
    #[error("account lookup failed: {0}")]
    Lookup(#[source] RpcError),

    /// The credential deletion failed; nothing was deleted.
    #[error("credential deletion failed, nothing was removed: {reason}")]
    Credentials { reason: String },

    /// The profile deletion failed after the credentials were already
    /// removed. The account can no longer sign in but its profile data
    /// remains; there is no compensation to restore the credentials.
    #[error("profile deletion failed after credentials were removed: {reason}")]
    Profile { reason: String },
}

impl DeletionError {
    /// Returns which step of the fixed sequence failed.
    pub fn failed_step(&self) -> DeletionStep {
        match self {
            DeletionError::Lookup(_) => DeletionStep::Lookup,
            DeletionError::Credentials { .. } => DeletionStep::Credentials,
            DeletionError::Profile { .. } => DeletionStep::Profile,
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
