//! PostgreSQL integration tests for the saga instance store.
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p saga --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{AuthUserId, CorrelationId, UserId};
use contracts::saga::{
    ConfirmationDelivered, CredentialCreated, CredentialCreationFailed, OnboardingEvent,
    ProfileCreated, RoleAssigned, StartOnboarding,
};
use saga::{OnboardingState, PostgresSagaStore, SagaInstance, SagaStore, StoreError};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_saga_instances_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresSagaStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE saga_instances")
        .execute(&pool)
        .await
        .unwrap();

    PostgresSagaStore::new(pool)
}

fn started(username: &str, email: &str) -> SagaInstance {
    let (instance, _) = SagaInstance::start(StartOnboarding {
        username: username.to_string(),
        email: email.to_string(),
        password: "p".to_string(),
    });
    instance
}

#[tokio::test]
async fn insert_and_get_roundtrip() {
    let store = get_test_store().await;
    let instance = started("alice", "alice@x.com");

    store.insert(&instance).await.unwrap();

    let loaded = store.get(instance.correlation_id()).await.unwrap().unwrap();
    assert_eq!(loaded.correlation_id(), instance.correlation_id());
    assert_eq!(
        loaded.current_state(),
        OnboardingState::AwaitingCredentialCreation
    );
    assert_eq!(loaded.username(), "alice");
    assert_eq!(loaded.email(), "alice@x.com");
    assert_eq!(loaded.confirmation_code(), instance.confirmation_code());
    assert_eq!(loaded.assigned_role(), "User");
    assert!(loaded.auth_user_id().is_none());
    assert!(loaded.user_id().is_none());
    assert!(loaded.completed_at().is_none());
    assert!(loaded.failure_reason().is_none());
}

#[tokio::test]
async fn get_unknown_returns_none() {
    let store = get_test_store().await;
    let result = store.get(CorrelationId::new()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn active_email_uniqueness_is_enforced_by_the_index() {
    let store = get_test_store().await;
    store.insert(&started("alice", "dup@x.com")).await.unwrap();

    let result = store.insert(&started("alice", "dup@x.com")).await;
    assert!(matches!(
        result,
        Err(StoreError::ActiveOnboardingExists { .. })
    ));
}

#[tokio::test]
async fn terminal_instance_frees_the_email_for_a_new_attempt() {
    let store = get_test_store().await;
    let mut failed = started("alice", "retry@x.com");
    store.insert(&failed).await.unwrap();

    failed
        .handle_event(&OnboardingEvent::CredentialCreationFailed(
            CredentialCreationFailed {
                correlation_id: failed.correlation_id(),
                reason: "duplicate".to_string(),
            },
        ))
        .unwrap();
    store.update(&failed).await.unwrap();

    // The partial unique index only covers non-terminal rows.
    store.insert(&started("alice", "retry@x.com")).await.unwrap();

    let active = store
        .find_active_by_email("retry@x.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(active.correlation_id(), failed.correlation_id());
}

#[tokio::test]
async fn update_persists_every_mutated_field() {
    let store = get_test_store().await;
    let mut instance = started("alice", "progress@x.com");
    store.insert(&instance).await.unwrap();

    let auth_user_id = AuthUserId::new();
    let user_id = UserId::new();
    let correlation_id = instance.correlation_id();

    for event in [
        OnboardingEvent::CredentialCreated(CredentialCreated {
            correlation_id,
            auth_user_id,
        }),
        OnboardingEvent::ConfirmationDelivered(ConfirmationDelivered { correlation_id }),
        OnboardingEvent::RoleAssigned(RoleAssigned {
            correlation_id,
            role: "User".to_string(),
        }),
        OnboardingEvent::ProfileCreated(ProfileCreated {
            correlation_id,
            user_id,
        }),
    ] {
        instance.handle_event(&event).unwrap();
        store.update(&instance).await.unwrap();
    }

    let loaded = store.get(correlation_id).await.unwrap().unwrap();
    assert_eq!(loaded.current_state(), OnboardingState::Completed);
    assert_eq!(loaded.auth_user_id(), Some(auth_user_id));
    assert_eq!(loaded.user_id(), Some(user_id));
    assert_eq!(loaded.assigned_role(), "User");
    assert!(loaded.completed_at().is_some());
}

#[tokio::test]
async fn update_unknown_instance_fails() {
    let store = get_test_store().await;
    let instance = started("alice", "ghost@x.com");

    let result = store.update(&instance).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn failed_instance_keeps_its_reason() {
    let store = get_test_store().await;
    let mut instance = started("alice", "failed@x.com");
    store.insert(&instance).await.unwrap();

    instance
        .handle_event(&OnboardingEvent::CredentialCreationFailed(
            CredentialCreationFailed {
                correlation_id: instance.correlation_id(),
                reason: "email already registered".to_string(),
            },
        ))
        .unwrap();
    store.update(&instance).await.unwrap();

    let loaded = store.get(instance.correlation_id()).await.unwrap().unwrap();
    assert_eq!(loaded.current_state(), OnboardingState::Failed);
    assert_eq!(loaded.failure_reason(), Some("email already registered"));
}

#[tokio::test]
async fn list_returns_the_audit_trail_oldest_first() {
    let store = get_test_store().await;
    let first = started("alice", "first@x.com");
    let second = started("bob", "second@x.com");
    store.insert(&first).await.unwrap();
    store.insert(&second).await.unwrap();

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[0].created_at() <= listed[1].created_at());
}
