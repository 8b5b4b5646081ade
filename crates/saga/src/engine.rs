//! Saga orchestration engine for the onboarding workflow.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::CorrelationId;
use contracts::saga::{OnboardingCommand, OnboardingEvent, StartOnboarding};
use messaging::{Message, Publisher};

use crate::error::{SagaError, StoreError};
use crate::instance::SagaInstance;
use crate::state::OnboardingState;
use crate::store::SagaStore;

/// Drives onboarding saga instances through their transition table.
///
/// The engine never blocks waiting for a reply: each transition is a
/// fire-and-react step that loads the instance, applies the event, writes
/// the instance back, and publishes the next command. The "wait" for the
/// following step is implicit in "no matching event has arrived yet".
///
/// Events for the same correlation ID may be handled by concurrent
/// workers (the transport redelivers, or two legitimate events race); a
/// per-instance lock serializes the read-transition-write sequence.
pub struct OnboardingEngine<S, P> {
    store: S,
    publisher: P,
    locks: Mutex<HashMap<CorrelationId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S, P> OnboardingEngine<S, P>
where
    S: SagaStore,
    P: Publisher,
{
    /// Creates a new engine over the given store and publisher.
    pub fn new(store: S, publisher: P) -> Self {
        Self {
            store,
            publisher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Starts a new onboarding workflow.
    ///
    /// Allocates the correlation ID, persists the instance, and publishes
    /// the first command. A start for an email that already has a
    /// non-terminal instance is rejected; the email is the natural key
    /// guarding against duplicate concurrent onboarding of one identity.
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn start(&self, request: StartOnboarding) -> Result<CorrelationId, SagaError> {
        metrics::counter!("onboarding_started_total").increment(1);

        let (instance, command) = SagaInstance::start(request);
        let correlation_id = instance.correlation_id();

        match self.store.insert(&instance).await {
            Ok(()) => {}
            Err(StoreError::ActiveOnboardingExists { email }) => {
                tracing::warn!(%email, "start rejected, onboarding already in progress");
                return Err(SagaError::OnboardingInProgress { email });
            }
            Err(e) => return Err(e.into()),
        }

        self.publish_command(command).await?;
        tracing::info!(%correlation_id, "onboarding started");
        Ok(correlation_id)
    }

    /// Applies one inbound event to its saga instance.
    ///
    /// The event is correlated strictly by its embedded correlation ID.
    /// An event for an unknown instance, or one the current state does not
    /// expect, is dropped with a warning — never queued or retried. `Ok`
    /// therefore means "consumed", not "caused a transition".
    #[tracing::instrument(
        skip(self, event),
        fields(event_type = event.event_type(), correlation_id = %event.correlation_id())
    )]
    pub async fn handle_event(&self, event: OnboardingEvent) -> Result<(), SagaError> {
        let correlation_id = event.correlation_id();
        let lock = self.instance_lock(correlation_id);
        let _guard = lock.lock().await;

        let Some(mut instance) = self.store.get(correlation_id).await? else {
            tracing::warn!("dropping event for unknown saga instance");
            metrics::counter!("onboarding_events_dropped_total").increment(1);
            return Ok(());
        };

        let state_before = instance.current_state();
        let Some(commands) = instance.handle_event(&event) else {
            tracing::warn!(state = %state_before, "dropping event not expected in current state");
            metrics::counter!("onboarding_events_dropped_total").increment(1);
            return Ok(());
        };

        self.store.update(&instance).await?;
        for command in commands {
            self.publish_command(command).await?;
        }

        match instance.current_state() {
            OnboardingState::Completed => {
                metrics::counter!("onboarding_completed_total").increment(1);
                tracing::info!("onboarding completed");
                self.forget_lock(correlation_id);
            }
            OnboardingState::Failed => {
                metrics::counter!("onboarding_failed_total").increment(1);
                tracing::warn!(reason = ?instance.failure_reason(), "onboarding failed");
                self.forget_lock(correlation_id);
            }
            state => {
                tracing::info!(from = %state_before, to = %state, "saga advanced");
            }
        }
        Ok(())
    }

    /// Loads a saga instance by correlation ID.
    pub async fn get(
        &self,
        correlation_id: CorrelationId,
    ) -> Result<Option<SagaInstance>, SagaError> {
        Ok(self.store.get(correlation_id).await?)
    }

    async fn publish_command(&self, command: OnboardingCommand) -> Result<(), SagaError> {
        let message = match &command {
            OnboardingCommand::CreateCredential(c) => Message::new(command.kind(), c),
            OnboardingCommand::SendConfirmation(c) => Message::new(command.kind(), c),
            OnboardingCommand::AssignRole(c) => Message::new(command.kind(), c),
            OnboardingCommand::CreateProfile(c) => Message::new(command.kind(), c),
        }?;
        tracing::info!(
            command = command.kind(),
            correlation_id = %command.correlation_id(),
            "publishing command"
        );
        self.publisher.publish(message).await?;
        Ok(())
    }

    fn instance_lock(&self, correlation_id: CorrelationId) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .unwrap()
            .entry(correlation_id)
            .or_default()
            .clone()
    }

    // Terminal instances accept no further transitions, so a waiter still
    // queued on the old lock can only produce a dropped event.
    fn forget_lock(&self, correlation_id: CorrelationId) {
        self.locks.lock().unwrap().remove(&correlation_id);
    }
}
