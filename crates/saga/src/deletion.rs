//! Ordered account deletion across the auth and user services.
//!
//! A fixed two-delete sequence with no compensation. Credentials go
//! first: if the profile delete then fails, the account is unusable but
//! not fully purged, which beats the reverse order's usable-but-partially-
//! deleted account. Neither call is retried.

use std::time::Duration;

use common::UserId;
use contracts::auth::{DeleteAuthRequest, DeleteAuthResponse};
use contracts::users::{DeleteUserRequest, DeleteUserResponse, GetUserRequest, UserRecord};
use messaging::{RequestTransport, RpcClient};
use serde::{Deserialize, Serialize};

use crate::error::DeletionError;

/// Confirmation of a fully completed deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionReceipt {
    pub user_id: UserId,
    pub username: String,
}

/// Deletes an account from both services in the fixed safe order.
pub struct AccountDeletion<T> {
    rpc: RpcClient<T>,
    timeout: Duration,
}

impl<T: RequestTransport> AccountDeletion<T> {
    /// Creates a deletion workflow with the default 10 second per-call
    /// deadline.
    pub fn new(rpc: RpcClient<T>) -> Self {
        Self {
            rpc,
            timeout: Duration::from_secs(10),
        }
    }

    /// Creates a deletion workflow with a custom per-call deadline.
    pub fn with_timeout(rpc: RpcClient<T>, timeout: Duration) -> Self {
        Self { rpc, timeout }
    }

    /// Deletes the account behind `user_id`.
    ///
    /// Sequence: look up the profile for its credential ID, delete the
    /// credentials, then delete the profile. Any fault, timeout, or
    /// explicit rejection aborts the remaining steps; the error names the
    /// step that failed. The profile delete is never attempted unless the
    /// credential delete succeeded.
    #[tracing::instrument(skip(self))]
    pub async fn delete_account(&self, user_id: UserId) -> Result<DeletionReceipt, DeletionError> {
        // Step 1: find the credential behind this profile.
        let user: UserRecord = self
            .rpc
            .call(GetUserRequest::KIND, &GetUserRequest { user_id }, self.timeout)
            .await
            .map_err(DeletionError::Lookup)?;
        tracing::info!(username = %user.username, auth_user_id = %user.auth_user_id, "deleting account");

        // Step 2: credentials first. Once this lands the account cannot
        // sign in, the safer of the two half-deleted states.
        let auth: DeleteAuthResponse = self
            .rpc
            .call(
                DeleteAuthRequest::KIND,
                &DeleteAuthRequest {
                    auth_user_id: user.auth_user_id,
                },
                self.timeout,
            )
            .await
            .map_err(|e| DeletionError::Credentials {
                reason: e.to_string(),
            })?;
        if !auth.success {
            return Err(DeletionError::Credentials {
                reason: "auth service reported failure".to_string(),
            });
        }

        // Step 3: only now remove the profile.
        let profile: DeleteUserResponse = self
            .rpc
            .call(
                DeleteUserRequest::KIND,
                &DeleteUserRequest { user_id },
                self.timeout,
            )
            .await
            .map_err(|e| DeletionError::Profile {
                reason: e.to_string(),
            })?;
        if !profile.success {
            return Err(DeletionError::Profile {
                reason: "user service reported failure".to_string(),
            });
        }

        tracing::info!(username = %user.username, "account deleted");
        Ok(DeletionReceipt {
            user_id,
            username: user.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use common::AuthUserId;
    use messaging::{Fault, InMemoryBus, ResponderReply};

    use super::*;
    use crate::error::DeletionStep;

    fn user_record(user_id: UserId, auth_user_id: AuthUserId) -> UserRecord {
        UserRecord {
            user_id,
            auth_user_id,
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
        }
    }

    fn respond_lookup(bus: &InMemoryBus, user_id: UserId, auth_user_id: AuthUserId) {
        bus.on_request(GetUserRequest::KIND, move |_| async move {
            ResponderReply::success(&user_record(user_id, auth_user_id))
        });
    }

    fn workflow(bus: &InMemoryBus) -> AccountDeletion<InMemoryBus> {
        AccountDeletion::with_timeout(bus.rpc_client(), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn deletes_credentials_then_profile() {
        let bus = InMemoryBus::new();
        let user_id = UserId::new();
        respond_lookup(&bus, user_id, AuthUserId::new());
        bus.on_request(DeleteAuthRequest::KIND, |_| async move {
            ResponderReply::success(&DeleteAuthResponse { success: true })
        });
        bus.on_request(DeleteUserRequest::KIND, |_| async move {
            ResponderReply::success(&DeleteUserResponse { success: true })
        });

        let receipt = workflow(&bus).delete_account(user_id).await.unwrap();

        assert_eq!(receipt.user_id, user_id);
        assert_eq!(receipt.username, "alice");
        assert_eq!(bus.request_count(DeleteAuthRequest::KIND), 1);
        assert_eq!(bus.request_count(DeleteUserRequest::KIND), 1);
    }

    #[tokio::test]
    async fn profile_delete_is_never_attempted_when_credential_delete_fails() {
        let bus = InMemoryBus::new();
        let user_id = UserId::new();
        respond_lookup(&bus, user_id, AuthUserId::new());
        bus.on_request(DeleteAuthRequest::KIND, |_| async move {
            ResponderReply::success(&DeleteAuthResponse { success: false })
        });
        bus.on_request(DeleteUserRequest::KIND, |_| async move {
            ResponderReply::success(&DeleteUserResponse { success: true })
        });

        let err = workflow(&bus).delete_account(user_id).await.unwrap_err();

        assert_eq!(err.failed_step(), DeletionStep::Credentials);
        assert_eq!(bus.request_count(DeleteUserRequest::KIND), 0);
    }

    #[tokio::test]
    async fn credential_delete_fault_aborts_the_sequence() {
        let bus = InMemoryBus::new();
        let user_id = UserId::new();
        respond_lookup(&bus, user_id, AuthUserId::new());
        bus.on_request(DeleteAuthRequest::KIND, |_| async move {
            ResponderReply::Fault(Fault::new("INTERNAL_ERROR", "auth database unavailable"))
        });

        let err = workflow(&bus).delete_account(user_id).await.unwrap_err();

        assert_eq!(err.failed_step(), DeletionStep::Credentials);
        assert_eq!(bus.request_count(DeleteUserRequest::KIND), 0);
    }

    #[tokio::test]
    async fn profile_failure_after_credential_delete_reports_degraded_state() {
        let bus = InMemoryBus::new();
        let user_id = UserId::new();
        respond_lookup(&bus, user_id, AuthUserId::new());
        bus.on_request(DeleteAuthRequest::KIND, |_| async move {
            ResponderReply::success(&DeleteAuthResponse { success: true })
        });
        bus.on_request(DeleteUserRequest::KIND, |_| async move {
            ResponderReply::success(&DeleteUserResponse { success: false })
        });

        let err = workflow(&bus).delete_account(user_id).await.unwrap_err();

        // Credentials are gone, the profile remains; no compensation runs.
        assert_eq!(err.failed_step(), DeletionStep::Profile);
        assert_eq!(bus.request_count(DeleteAuthRequest::KIND), 1);
    }

    #[tokio::test]
    async fn lookup_failure_deletes_nothing() {
        let bus = InMemoryBus::new();
        bus.on_request(GetUserRequest::KIND, |_| async move {
            ResponderReply::Fault(Fault::new("USER_NOT_FOUND", "no such user"))
        });

        let err = workflow(&bus).delete_account(UserId::new()).await.unwrap_err();

        assert_eq!(err.failed_step(), DeletionStep::Lookup);
        assert_eq!(bus.request_count(DeleteAuthRequest::KIND), 0);
        assert_eq!(bus.request_count(DeleteUserRequest::KIND), 0);
    }

    #[tokio::test]
    async fn lookup_timeout_deletes_nothing() {
        let bus = InMemoryBus::new();
        bus.on_request(GetUserRequest::KIND, |_| async move {
            ResponderReply::NoReply
        });

        let err = workflow(&bus).delete_account(UserId::new()).await.unwrap_err();

        assert_eq!(err.failed_step(), DeletionStep::Lookup);
        assert!(matches!(err, DeletionError::Lookup(e) if e.is_timeout()));
        assert_eq!(bus.request_count(DeleteAuthRequest::KIND), 0);
    }
}
