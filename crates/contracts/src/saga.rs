//! Onboarding saga contracts: the start event, the commands the engine
//! sends to downstream services, and the reply events they publish back.
//!
//! Commands and events are grouped into the [`OnboardingCommand`] and
//! [`OnboardingEvent`] sum types so the engine's transition table can match
//! on them exhaustively. Every post-start message carries its correlation
//! ID as a named field; routing never inspects anything else.

use common::{AuthUserId, CorrelationId, UserId};
use serde::{Deserialize, Serialize};

use crate::urls::UrlRecord;

/// Role assigned to a user when the auth service reports nothing else.
pub const DEFAULT_ROLE: &str = "User";

/// Event that starts a new onboarding workflow.
///
/// Carries no correlation ID: the engine allocates one and dedupes on the
/// email natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartOnboarding {
    pub username: String,
    pub email: String,
    pub password: String,
}

// === Commands to downstream services ===

/// Asks the auth service to create a credential record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCredentialCommand {
    pub correlation_id: CorrelationId,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Asks the mail service to deliver the confirmation code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendConfirmationCommand {
    pub correlation_id: CorrelationId,
    pub email: String,
    pub code: String,
}

/// Asks the auth service to assign the default role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRoleCommand {
    pub correlation_id: CorrelationId,
    pub auth_user_id: AuthUserId,
}

/// Asks the user service to create the profile record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfileCommand {
    pub correlation_id: CorrelationId,
    pub auth_user_id: AuthUserId,
    pub username: String,
    pub email: String,
}

/// A command the saga engine publishes to a downstream service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OnboardingCommand {
    CreateCredential(CreateCredentialCommand),
    SendConfirmation(SendConfirmationCommand),
    AssignRole(AssignRoleCommand),
    CreateProfile(CreateProfileCommand),
}

impl OnboardingCommand {
    /// Returns the wire name of the command.
    pub fn kind(&self) -> &'static str {
        match self {
            OnboardingCommand::CreateCredential(_) => "CreateCredentialCommand",
            OnboardingCommand::SendConfirmation(_) => "SendConfirmationCommand",
            OnboardingCommand::AssignRole(_) => "AssignRoleCommand",
            OnboardingCommand::CreateProfile(_) => "CreateProfileCommand",
        }
    }

    /// Returns the correlation ID of the saga instance this command belongs to.
    pub fn correlation_id(&self) -> CorrelationId {
        match self {
            OnboardingCommand::CreateCredential(c) => c.correlation_id,
            OnboardingCommand::SendConfirmation(c) => c.correlation_id,
            OnboardingCommand::AssignRole(c) => c.correlation_id,
            OnboardingCommand::CreateProfile(c) => c.correlation_id,
        }
    }
}

// === Reply events from downstream services ===

/// The auth service created the credential record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialCreated {
    pub correlation_id: CorrelationId,
    pub auth_user_id: AuthUserId,
}

/// The auth service refused to create the credential record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialCreationFailed {
    pub correlation_id: CorrelationId,
    pub reason: String,
}

/// The mail service delivered the confirmation code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationDelivered {
    pub correlation_id: CorrelationId,
}

/// The auth service assigned a role to the credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssigned {
    pub correlation_id: CorrelationId,
    pub role: String,
}

/// The user service created the profile record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCreated {
    pub correlation_id: CorrelationId,
    pub user_id: UserId,
}

/// The user service refused to create the profile record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCreationFailed {
    pub correlation_id: CorrelationId,
    pub reason: String,
}

/// An event a downstream service publishes back to the saga engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OnboardingEvent {
    CredentialCreated(CredentialCreated),
    CredentialCreationFailed(CredentialCreationFailed),
    ConfirmationDelivered(ConfirmationDelivered),
    RoleAssigned(RoleAssigned),
    ProfileCreated(ProfileCreated),
    ProfileCreationFailed(ProfileCreationFailed),
}

impl OnboardingEvent {
    /// Returns the wire name of the event.
    pub fn event_type(&self) -> &'static str {
        match self {
            OnboardingEvent::CredentialCreated(_) => "CredentialCreated",
            OnboardingEvent::CredentialCreationFailed(_) => "CredentialCreationFailed",
            OnboardingEvent::ConfirmationDelivered(_) => "ConfirmationDelivered",
            OnboardingEvent::RoleAssigned(_) => "RoleAssigned",
            OnboardingEvent::ProfileCreated(_) => "ProfileCreated",
            OnboardingEvent::ProfileCreationFailed(_) => "ProfileCreationFailed",
        }
    }

    /// Returns the correlation ID embedded in the event.
    pub fn correlation_id(&self) -> CorrelationId {
        match self {
            OnboardingEvent::CredentialCreated(e) => e.correlation_id,
            OnboardingEvent::CredentialCreationFailed(e) => e.correlation_id,
            OnboardingEvent::ConfirmationDelivered(e) => e.correlation_id,
            OnboardingEvent::RoleAssigned(e) => e.correlation_id,
            OnboardingEvent::ProfileCreated(e) => e.correlation_id,
            OnboardingEvent::ProfileCreationFailed(e) => e.correlation_id,
        }
    }
}

/// A user profile joined with auth info and the user's short URLs.
///
/// Output row of the directory aggregation. `role` and
/// `is_email_verified` fall back to [`DEFAULT_ROLE`] and `false` when the
/// auth lookup fails; `urls` falls back to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWithUrls {
    pub user_id: UserId,
    pub auth_user_id: AuthUserId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_email_verified: bool,
    pub urls: Vec<UrlRecord>,
}
