use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::CorrelationId;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::instance::SagaInstance;
use crate::store::SagaStore;

/// In-memory saga instance store.
///
/// Provides the same interface as the PostgreSQL implementation but keeps
/// everything in process memory: a restart loses all in-flight instances.
/// The active-email uniqueness check runs under the map's write lock, so
/// two racing starts for the same email cannot both insert.
#[derive(Clone, Default)]
pub struct InMemorySagaStore {
    instances: Arc<RwLock<HashMap<CorrelationId, SagaInstance>>>,
}

impl InMemorySagaStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of instances, terminal ones included.
    pub async fn instance_count(&self) -> usize {
        self.instances.read().await.len()
    }
}

#[async_trait]
impl SagaStore for InMemorySagaStore {
    async fn insert(&self, instance: &SagaInstance) -> Result<(), StoreError> {
        let mut instances = self.instances.write().await;

        let active_exists = instances
            .values()
            .any(|i| i.email() == instance.email() && !i.current_state().is_terminal());
        if active_exists {
            return Err(StoreError::ActiveOnboardingExists {
                email: instance.email().to_string(),
            });
        }

        instances.insert(instance.correlation_id(), instance.clone());
        Ok(())
    }

    async fn get(&self, correlation_id: CorrelationId) -> Result<Option<SagaInstance>, StoreError> {
        Ok(self.instances.read().await.get(&correlation_id).cloned())
    }

    async fn find_active_by_email(&self, email: &str) -> Result<Option<SagaInstance>, StoreError> {
        Ok(self
            .instances
            .read()
            .await
            .values()
            .find(|i| i.email() == email && !i.current_state().is_terminal())
            .cloned())
    }

    async fn update(&self, instance: &SagaInstance) -> Result<(), StoreError> {
        let mut instances = self.instances.write().await;
        let correlation_id = instance.correlation_id();

        if !instances.contains_key(&correlation_id) {
            return Err(StoreError::NotFound(correlation_id));
        }
        instances.insert(correlation_id, instance.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SagaInstance>, StoreError> {
        let mut instances: Vec<_> = self.instances.read().await.values().cloned().collect();
        instances.sort_by_key(|i| i.created_at());
        Ok(instances)
    }
}
