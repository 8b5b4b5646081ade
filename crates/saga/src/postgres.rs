use std::str::FromStr;

use async_trait::async_trait;
use common::{AuthUserId, CorrelationId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::StoreError;
use crate::instance::SagaInstance;
use crate::state::OnboardingState;
use crate::store::SagaStore;

/// PostgreSQL-backed saga instance store.
///
/// One row per instance in `saga_instances`; a partial unique index on
/// `email` over non-terminal states enforces the single-active-onboarding
/// rule at the database level, so concurrent starts racing across
/// processes cannot both insert.
#[derive(Clone)]
pub struct PostgresSagaStore {
    pool: PgPool,
}

const COLUMNS: &str = "correlation_id, current_state, username, email, auth_user_id, \
     confirmation_code, assigned_role, user_id, created_at, completed_at, failure_reason";

impl PostgresSagaStore {
    /// Creates a new PostgreSQL saga store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_instance(row: PgRow) -> Result<SagaInstance, StoreError> {
        let state_text: String = row.try_get("current_state")?;
        let current_state = OnboardingState::from_str(&state_text)
            .map_err(|_| StoreError::InvalidState(state_text))?;

        Ok(SagaInstance {
            correlation_id: CorrelationId::from_uuid(row.try_get::<Uuid, _>("correlation_id")?),
            current_state,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            auth_user_id: row
                .try_get::<Option<Uuid>, _>("auth_user_id")?
                .map(AuthUserId::from_uuid),
            confirmation_code: row.try_get("confirmation_code")?,
            assigned_role: row.try_get("assigned_role")?,
            user_id: row
                .try_get::<Option<Uuid>, _>("user_id")?
                .map(UserId::from_uuid),
            created_at: row.try_get("created_at")?,
            completed_at: row.try_get("completed_at")?,
            failure_reason: row.try_get("failure_reason")?,
        })
    }
}

#[async_trait]
impl SagaStore for PostgresSagaStore {
    async fn insert(&self, instance: &SagaInstance) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO saga_instances
                (correlation_id, current_state, username, email, auth_user_id,
                 confirmation_code, assigned_role, user_id, created_at, completed_at,
                 failure_reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(instance.correlation_id().as_uuid())
        .bind(instance.current_state().as_str())
        .bind(instance.username())
        .bind(instance.email())
        .bind(instance.auth_user_id().map(|id| id.as_uuid()))
        .bind(instance.confirmation_code())
        .bind(instance.assigned_role())
        .bind(instance.user_id().map(|id| id.as_uuid()))
        .bind(instance.created_at())
        .bind(instance.completed_at())
        .bind(instance.failure_reason())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Unique violation on the active-email partial index
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_active_onboarding_email")
            {
                return StoreError::ActiveOnboardingExists {
                    email: instance.email().to_string(),
                };
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn get(&self, correlation_id: CorrelationId) -> Result<Option<SagaInstance>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM saga_instances WHERE correlation_id = $1"
        ))
        .bind(correlation_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_instance).transpose()
    }

    async fn find_active_by_email(&self, email: &str) -> Result<Option<SagaInstance>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM saga_instances \
             WHERE email = $1 AND current_state NOT IN ('Completed', 'Failed')"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_instance).transpose()
    }

    async fn update(&self, instance: &SagaInstance) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE saga_instances
            SET current_state = $2,
                auth_user_id = $3,
                assigned_role = $4,
                user_id = $5,
                completed_at = $6,
                failure_reason = $7
            WHERE correlation_id = $1
            "#,
        )
        .bind(instance.correlation_id().as_uuid())
        .bind(instance.current_state().as_str())
        .bind(instance.auth_user_id().map(|id| id.as_uuid()))
        .bind(instance.assigned_role())
        .bind(instance.user_id().map(|id| id.as_uuid()))
        .bind(instance.completed_at())
        .bind(instance.failure_reason())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(instance.correlation_id()));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SagaInstance>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM saga_instances ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_instance).collect()
    }
}
