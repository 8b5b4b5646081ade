//! Auth service contracts.

use common::AuthUserId;
use serde::{Deserialize, Serialize};

/// Looks up the auth record for a single credential ID.
///
/// Replies with an [`AuthRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetAuthByIdRequest {
    pub auth_user_id: AuthUserId,
}

impl GetAuthByIdRequest {
    pub const KIND: &'static str = "GetAuthById";
}

/// Looks up auth records for a batch of credential IDs.
///
/// The reply lists only the records that exist; callers substitute
/// defaults for absent IDs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetAuthsByIdsRequest {
    pub ids: Vec<AuthUserId>,
}

impl GetAuthsByIdsRequest {
    pub const KIND: &'static str = "GetAuthsByIds";
}

/// Auth info for one credential record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRecord {
    pub auth_user_id: AuthUserId,
    pub role: String,
    pub is_email_verified: bool,
}

/// Reply to [`GetAuthsByIdsRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetAuthsByIdsResponse {
    pub auths: Vec<AuthRecord>,
}

/// Deletes a credential record. Once this succeeds the account can no
/// longer authenticate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAuthRequest {
    pub auth_user_id: AuthUserId,
}

impl DeleteAuthRequest {
    pub const KIND: &'static str = "DeleteAuth";
}

/// Reply to [`DeleteAuthRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAuthResponse {
    pub success: bool,
}
