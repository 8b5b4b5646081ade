//! Onboarding saga instance and its transition table.

use chrono::{DateTime, Utc};
use common::{AuthUserId, CorrelationId, UserId};
use contracts::saga::{
    AssignRoleCommand, CreateCredentialCommand, CreateProfileCommand, OnboardingCommand,
    OnboardingEvent, SendConfirmationCommand, StartOnboarding, DEFAULT_ROLE,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::OnboardingState;

/// One row per onboarding workflow.
///
/// Created by [`SagaInstance::start`], mutated exclusively through
/// [`SagaInstance::handle_event`], and never deleted: terminal instances
/// remain in the store as an audit trail. `username` and `email` are
/// captured at start and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaInstance {
    pub(crate) correlation_id: CorrelationId,
    pub(crate) current_state: OnboardingState,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) auth_user_id: Option<AuthUserId>,
    pub(crate) confirmation_code: String,
    pub(crate) assigned_role: String,
    pub(crate) user_id: Option<UserId>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) completed_at: Option<DateTime<Utc>>,
    pub(crate) failure_reason: Option<String>,
}

impl SagaInstance {
    /// Starts a new onboarding workflow.
    ///
    /// Allocates a fresh correlation ID, captures the identity fields,
    /// generates the single-use confirmation code, and yields the first
    /// command for the auth service.
    pub fn start(request: StartOnboarding) -> (Self, OnboardingCommand) {
        let correlation_id = CorrelationId::new();
        let instance = Self {
            correlation_id,
            current_state: OnboardingState::AwaitingCredentialCreation,
            username: request.username.clone(),
            email: request.email.clone(),
            auth_user_id: None,
            confirmation_code: generate_confirmation_code(),
            assigned_role: DEFAULT_ROLE.to_string(),
            user_id: None,
            created_at: Utc::now(),
            completed_at: None,
            failure_reason: None,
        };
        let command = OnboardingCommand::CreateCredential(CreateCredentialCommand {
            correlation_id,
            username: request.username,
            email: request.email,
            password: request.password,
        });
        (instance, command)
    }

    /// Applies one inbound event to the instance.
    ///
    /// This is the transition table: it matches `(current state, event)`,
    /// records the event's payload on the instance, advances the state,
    /// and returns the commands to publish. `None` means no transition
    /// matches — the caller drops the event with a warning and the
    /// instance is untouched. Performs no I/O.
    pub fn handle_event(&mut self, event: &OnboardingEvent) -> Option<Vec<OnboardingCommand>> {
        use OnboardingState::*;

        match (self.current_state, event) {
            (AwaitingCredentialCreation, OnboardingEvent::CredentialCreated(e)) => {
                self.auth_user_id = Some(e.auth_user_id);
                self.current_state = AwaitingConfirmationDelivery;
                Some(vec![OnboardingCommand::SendConfirmation(
                    SendConfirmationCommand {
                        correlation_id: self.correlation_id,
                        email: self.email.clone(),
                        code: self.confirmation_code.clone(),
                    },
                )])
            }
            (AwaitingCredentialCreation, OnboardingEvent::CredentialCreationFailed(e)) => {
                self.fail(e.reason.clone());
                Some(Vec::new())
            }
            (AwaitingConfirmationDelivery, OnboardingEvent::ConfirmationDelivered(_)) => {
                // Set when the credential step completed.
                let auth_user_id = self.auth_user_id?;
                self.current_state = AwaitingRoleAssignment;
                Some(vec![OnboardingCommand::AssignRole(AssignRoleCommand {
                    correlation_id: self.correlation_id,
                    auth_user_id,
                })])
            }
            (AwaitingRoleAssignment, OnboardingEvent::RoleAssigned(e)) => {
                let auth_user_id = self.auth_user_id?;
                self.assigned_role = e.role.clone();
                self.current_state = AwaitingProfileCreation;
                Some(vec![OnboardingCommand::CreateProfile(CreateProfileCommand {
                    correlation_id: self.correlation_id,
                    auth_user_id,
                    username: self.username.clone(),
                    email: self.email.clone(),
                })])
            }
            (AwaitingProfileCreation, OnboardingEvent::ProfileCreated(e)) => {
                self.user_id = Some(e.user_id);
                self.completed_at = Some(Utc::now());
                self.current_state = Completed;
                Some(Vec::new())
            }
            (AwaitingProfileCreation, OnboardingEvent::ProfileCreationFailed(e)) => {
                self.fail(e.reason.clone());
                Some(Vec::new())
            }
            _ => None,
        }
    }

    fn fail(&mut self, reason: String) {
        self.failure_reason = Some(reason);
        self.current_state = OnboardingState::Failed;
    }
}

// Query methods
impl SagaInstance {
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn current_state(&self) -> OnboardingState {
        self.current_state
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn auth_user_id(&self) -> Option<AuthUserId> {
        self.auth_user_id
    }

    pub fn confirmation_code(&self) -> &str {
        &self.confirmation_code
    }

    pub fn assigned_role(&self) -> &str {
        &self.assigned_role
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }
}

/// Six decimal digits derived from a v4 UUID.
fn generate_confirmation_code() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000;
    format!("{n:06}")
}

#[cfg(test)]
mod tests {
    use contracts::saga::{
        ConfirmationDelivered, CredentialCreated, CredentialCreationFailed, ProfileCreated,
        ProfileCreationFailed, RoleAssigned,
    };

    use super::*;

    fn start_request() -> StartOnboarding {
        StartOnboarding {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "p".to_string(),
        }
    }

    fn credential_created(instance: &SagaInstance, auth_user_id: AuthUserId) -> OnboardingEvent {
        OnboardingEvent::CredentialCreated(CredentialCreated {
            correlation_id: instance.correlation_id(),
            auth_user_id,
        })
    }

    #[test]
    fn start_captures_identity_and_emits_credential_command() {
        let (instance, command) = SagaInstance::start(start_request());

        assert_eq!(
            instance.current_state(),
            OnboardingState::AwaitingCredentialCreation
        );
        assert_eq!(instance.username(), "alice");
        assert_eq!(instance.email(), "alice@x.com");
        assert_eq!(instance.assigned_role(), DEFAULT_ROLE);
        assert!(instance.auth_user_id().is_none());
        assert!(instance.user_id().is_none());
        assert_eq!(instance.confirmation_code().len(), 6);

        match command {
            OnboardingCommand::CreateCredential(c) => {
                assert_eq!(c.correlation_id, instance.correlation_id());
                assert_eq!(c.username, "alice");
                assert_eq!(c.email, "alice@x.com");
                assert_eq!(c.password, "p");
            }
            other => panic!("expected CreateCredential, got {}", other.kind()),
        }
    }

    #[test]
    fn two_starts_produce_distinct_correlation_ids() {
        let (a, _) = SagaInstance::start(start_request());
        let (b, _) = SagaInstance::start(StartOnboarding {
            username: "bob".to_string(),
            email: "bob@x.com".to_string(),
            password: "q".to_string(),
        });
        assert_ne!(a.correlation_id(), b.correlation_id());
    }

    #[test]
    fn happy_path_reaches_completed_with_all_fields() {
        let (mut instance, _) = SagaInstance::start(start_request());
        let auth_user_id = AuthUserId::new();
        let user_id = UserId::new();

        // CredentialCreated -> SendConfirmation
        let commands = instance
            .handle_event(&credential_created(&instance, auth_user_id))
            .unwrap();
        assert_eq!(
            instance.current_state(),
            OnboardingState::AwaitingConfirmationDelivery
        );
        assert_eq!(instance.auth_user_id(), Some(auth_user_id));
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            OnboardingCommand::SendConfirmation(c) => {
                assert_eq!(c.email, "alice@x.com");
                assert_eq!(c.code, instance.confirmation_code());
            }
            other => panic!("expected SendConfirmation, got {}", other.kind()),
        }

        // ConfirmationDelivered -> AssignRole
        let commands = instance
            .handle_event(&OnboardingEvent::ConfirmationDelivered(
                ConfirmationDelivered {
                    correlation_id: instance.correlation_id(),
                },
            ))
            .unwrap();
        assert_eq!(
            instance.current_state(),
            OnboardingState::AwaitingRoleAssignment
        );
        assert!(matches!(commands[0], OnboardingCommand::AssignRole(_)));

        // RoleAssigned -> CreateProfile
        let commands = instance
            .handle_event(&OnboardingEvent::RoleAssigned(RoleAssigned {
                correlation_id: instance.correlation_id(),
                role: "User".to_string(),
            }))
            .unwrap();
        assert_eq!(
            instance.current_state(),
            OnboardingState::AwaitingProfileCreation
        );
        match &commands[0] {
            OnboardingCommand::CreateProfile(c) => {
                assert_eq!(c.auth_user_id, auth_user_id);
                assert_eq!(c.username, "alice");
            }
            other => panic!("expected CreateProfile, got {}", other.kind()),
        }

        // ProfileCreated -> Completed
        let commands = instance
            .handle_event(&OnboardingEvent::ProfileCreated(ProfileCreated {
                correlation_id: instance.correlation_id(),
                user_id,
            }))
            .unwrap();
        assert!(commands.is_empty());
        assert_eq!(instance.current_state(), OnboardingState::Completed);
        assert_eq!(instance.user_id(), Some(user_id));
        assert_eq!(instance.assigned_role(), "User");
        assert!(instance.completed_at().is_some());
    }

    #[test]
    fn credential_failure_terminates_the_instance() {
        let (mut instance, _) = SagaInstance::start(start_request());

        let commands = instance
            .handle_event(&OnboardingEvent::CredentialCreationFailed(
                CredentialCreationFailed {
                    correlation_id: instance.correlation_id(),
                    reason: "email already registered".to_string(),
                },
            ))
            .unwrap();

        assert!(commands.is_empty());
        assert_eq!(instance.current_state(), OnboardingState::Failed);
        assert_eq!(instance.failure_reason(), Some("email already registered"));
    }

    #[test]
    fn profile_failure_terminates_without_undoing_credentials() {
        let (mut instance, _) = SagaInstance::start(start_request());
        let auth_user_id = AuthUserId::new();

        instance
            .handle_event(&credential_created(&instance, auth_user_id))
            .unwrap();
        instance
            .handle_event(&OnboardingEvent::ConfirmationDelivered(
                ConfirmationDelivered {
                    correlation_id: instance.correlation_id(),
                },
            ))
            .unwrap();
        instance
            .handle_event(&OnboardingEvent::RoleAssigned(RoleAssigned {
                correlation_id: instance.correlation_id(),
                role: "User".to_string(),
            }))
            .unwrap();

        let commands = instance
            .handle_event(&OnboardingEvent::ProfileCreationFailed(
                ProfileCreationFailed {
                    correlation_id: instance.correlation_id(),
                    reason: "database error".to_string(),
                },
            ))
            .unwrap();

        // No compensating command for the already-created credential.
        assert!(commands.is_empty());
        assert_eq!(instance.current_state(), OnboardingState::Failed);
        assert_eq!(instance.failure_reason(), Some("database error"));
        assert_eq!(instance.auth_user_id(), Some(auth_user_id));
    }

    #[test]
    fn out_of_order_event_is_unmatched_and_leaves_state_alone() {
        let (mut instance, _) = SagaInstance::start(start_request());

        // RoleAssigned while still awaiting credential creation.
        let result = instance.handle_event(&OnboardingEvent::RoleAssigned(RoleAssigned {
            correlation_id: instance.correlation_id(),
            role: "Admin".to_string(),
        }));

        assert!(result.is_none());
        assert_eq!(
            instance.current_state(),
            OnboardingState::AwaitingCredentialCreation
        );
        assert_eq!(instance.assigned_role(), DEFAULT_ROLE);
    }

    #[test]
    fn terminal_instance_ignores_further_events() {
        let (mut instance, _) = SagaInstance::start(start_request());
        instance
            .handle_event(&OnboardingEvent::CredentialCreationFailed(
                CredentialCreationFailed {
                    correlation_id: instance.correlation_id(),
                    reason: "nope".to_string(),
                },
            ))
            .unwrap();
        assert_eq!(instance.current_state(), OnboardingState::Failed);

        // A legitimate-looking event for this correlation id arrives late.
        let result = instance.handle_event(&credential_created(&instance, AuthUserId::new()));
        assert!(result.is_none());
        assert_eq!(instance.current_state(), OnboardingState::Failed);
        assert!(instance.auth_user_id().is_none());
    }

    #[test]
    fn duplicate_event_in_consumed_state_is_unmatched() {
        let (mut instance, _) = SagaInstance::start(start_request());
        let auth_user_id = AuthUserId::new();
        let event = credential_created(&instance, auth_user_id);

        assert!(instance.handle_event(&event).is_some());
        // Redelivery of the same event: the state has moved on.
        assert!(instance.handle_event(&event).is_none());
        assert_eq!(
            instance.current_state(),
            OnboardingState::AwaitingConfirmationDelivery
        );
    }

    #[test]
    fn serialization_roundtrip() {
        let (mut instance, _) = SagaInstance::start(start_request());
        instance
            .handle_event(&credential_created(&instance, AuthUserId::new()))
            .unwrap();

        let json = serde_json::to_string(&instance).unwrap();
        let deserialized: SagaInstance = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.correlation_id(), instance.correlation_id());
        assert_eq!(deserialized.current_state(), instance.current_state());
        assert_eq!(deserialized.confirmation_code(), instance.confirmation_code());
    }
}
