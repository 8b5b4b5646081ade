//! Saga instance store trait.

use async_trait::async_trait;
use common::CorrelationId;

use crate::error::StoreError;
use crate::instance::SagaInstance;

/// Persistence for saga instances, keyed by correlation ID.
///
/// The engine serializes all transitions for a given correlation ID, so a
/// store only needs atomic single-row operations plus the active-email
/// uniqueness check in [`SagaStore::insert`]. The in-memory implementation
/// loses in-flight instances on restart; deployments that need crash
/// recovery use the PostgreSQL-backed one.
#[async_trait]
pub trait SagaStore: Send + Sync {
    /// Inserts a newly started instance.
    ///
    /// Fails with [`StoreError::ActiveOnboardingExists`] when a
    /// non-terminal instance with the same email is already present;
    /// terminal instances for the email do not block a new onboarding.
    async fn insert(&self, instance: &SagaInstance) -> Result<(), StoreError>;

    /// Loads an instance by correlation ID.
    async fn get(&self, correlation_id: CorrelationId) -> Result<Option<SagaInstance>, StoreError>;

    /// Finds the non-terminal instance for an email, if any.
    async fn find_active_by_email(&self, email: &str) -> Result<Option<SagaInstance>, StoreError>;

    /// Writes back a mutated instance.
    ///
    /// Fails with [`StoreError::NotFound`] when no row exists for the
    /// instance's correlation ID.
    async fn update(&self, instance: &SagaInstance) -> Result<(), StoreError>;

    /// Returns every instance, terminal ones included, oldest first.
    ///
    /// Instances are never deleted; this is the audit trail.
    async fn list(&self) -> Result<Vec<SagaInstance>, StoreError>;
}
