//! Onboarding saga state machine.

use serde::{Deserialize, Serialize};

/// The state of an onboarding workflow instance.
///
/// State transitions:
/// ```text
/// (start) ──► AwaitingCredentialCreation ──► AwaitingConfirmationDelivery
///                        │                              │
///                        ▼                              ▼
///                      Failed                  AwaitingRoleAssignment
///                        ▲                              │
///                        │                              ▼
///                        └──────────────── AwaitingProfileCreation ──► Completed
/// ```
///
/// Only the listed edges exist; an event arriving in any other state is
/// unmatched and dropped. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OnboardingState {
    /// Waiting for the auth service to create the credential record.
    AwaitingCredentialCreation,

    /// Waiting for the mail service to deliver the confirmation code.
    AwaitingConfirmationDelivery,

    /// Waiting for the auth service to assign the default role.
    AwaitingRoleAssignment,

    /// Waiting for the user service to create the profile record.
    AwaitingProfileCreation,

    /// Every step succeeded (terminal state).
    Completed,

    /// A step failed; no completed step is rolled back (terminal state).
    Failed,
}

impl OnboardingState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OnboardingState::Completed | OnboardingState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingState::AwaitingCredentialCreation => "AwaitingCredentialCreation",
            OnboardingState::AwaitingConfirmationDelivery => "AwaitingConfirmationDelivery",
            OnboardingState::AwaitingRoleAssignment => "AwaitingRoleAssignment",
            OnboardingState::AwaitingProfileCreation => "AwaitingProfileCreation",
            OnboardingState::Completed => "Completed",
            OnboardingState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for OnboardingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing a state name fails.
#[derive(Debug, Clone)]
pub struct ParseStateError(pub String);

impl std::fmt::Display for ParseStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown onboarding state: {}", self.0)
    }
}

impl std::error::Error for ParseStateError {}

impl std::str::FromStr for OnboardingState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AwaitingCredentialCreation" => Ok(OnboardingState::AwaitingCredentialCreation),
            "AwaitingConfirmationDelivery" => Ok(OnboardingState::AwaitingConfirmationDelivery),
            "AwaitingRoleAssignment" => Ok(OnboardingState::AwaitingRoleAssignment),
            "AwaitingProfileCreation" => Ok(OnboardingState::AwaitingProfileCreation),
            "Completed" => Ok(OnboardingState::Completed),
            "Failed" => Ok(OnboardingState::Failed),
            other => Err(ParseStateError(other.to_string())),
        }
    }
}
