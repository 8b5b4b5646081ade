//! Fan-out aggregation of user, auth, and URL data.
//!
//! Combines three services' views of an account into one response. The
//! primary call decides the fate of the aggregate; auxiliary sub-calls
//! degrade to documented defaults (`role = "User"`,
//! `is_email_verified = false`, empty URL list) instead of failing it.

use std::collections::HashMap;
use std::time::Duration;

use common::{AuthUserId, UserId};
use contracts::auth::{AuthRecord, GetAuthByIdRequest, GetAuthsByIdsRequest, GetAuthsByIdsResponse};
use contracts::saga::{UserWithUrls, DEFAULT_ROLE};
use contracts::urls::{
    GetUrlsByUserIdsRequest, GetUrlsByUserIdsResponse, GetUrlsByUserRequest, GetUrlsByUserResponse,
    UrlRecord,
};
use contracts::users::{GetUserRequest, ListUsersRequest, ListUsersResponse, UserRecord};
use messaging::{RequestTransport, RpcClient};

use crate::error::DirectoryError;

/// Per-call deadlines for the directory aggregation.
#[derive(Debug, Clone)]
pub struct DirectoryTimeouts {
    /// Deadline for the primary user-listing call.
    pub list: Duration,
    /// Deadline for single-entity lookups.
    pub lookup: Duration,
    /// Deadline for auxiliary (auth/url) calls.
    pub auxiliary: Duration,
}

impl Default for DirectoryTimeouts {
    fn default() -> Self {
        Self {
            list: Duration::from_secs(30),
            lookup: Duration::from_secs(10),
            auxiliary: Duration::from_secs(5),
        }
    }
}

/// Aggregates user profiles with auth info and short-url lists.
pub struct UserDirectory<T> {
    rpc: RpcClient<T>,
    timeouts: DirectoryTimeouts,
}

impl<T: RequestTransport> UserDirectory<T> {
    /// Creates a directory with default timeouts.
    pub fn new(rpc: RpcClient<T>) -> Self {
        Self {
            rpc,
            timeouts: DirectoryTimeouts::default(),
        }
    }

    /// Creates a directory with custom timeouts.
    pub fn with_timeouts(rpc: RpcClient<T>, timeouts: DirectoryTimeouts) -> Self {
        Self { rpc, timeouts }
    }

    /// Aggregates one user with their auth info and URLs.
    ///
    /// The profile lookup failing fails the call; the two dependent calls
    /// degrade to defaults.
    #[tracing::instrument(skip(self))]
    pub async fn user_with_urls(&self, user_id: UserId) -> Result<UserWithUrls, DirectoryError> {
        let user: UserRecord = self
            .rpc
            .call(
                GetUserRequest::KIND,
                &GetUserRequest { user_id },
                self.timeouts.lookup,
            )
            .await
            .map_err(DirectoryError::UserLookup)?;

        let (role, is_email_verified) = match self
            .rpc
            .call::<_, AuthRecord>(
                GetAuthByIdRequest::KIND,
                &GetAuthByIdRequest {
                    auth_user_id: user.auth_user_id,
                },
                self.timeouts.auxiliary,
            )
            .await
        {
            Ok(auth) => (auth.role, auth.is_email_verified),
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "auth lookup failed, using defaults");
                (DEFAULT_ROLE.to_string(), false)
            }
        };

        let urls = match self
            .rpc
            .call::<_, GetUrlsByUserResponse>(
                GetUrlsByUserRequest::KIND,
                &GetUrlsByUserRequest { user_id },
                self.timeouts.auxiliary,
            )
            .await
        {
            Ok(response) => response.urls,
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "url lookup failed, returning empty list");
                Vec::new()
            }
        };

        Ok(join_row(user, role, is_email_verified, urls))
    }

    /// Aggregates every user with their auth info and URLs.
    ///
    /// Issues exactly one batched call per auxiliary service regardless of
    /// how many users exist, then joins in memory. The output has one row
    /// per user in listing order; a failed auxiliary batch defaults every
    /// row's fields rather than failing the aggregate.
    #[tracing::instrument(skip(self))]
    pub async fn all_users_with_urls(&self) -> Result<Vec<UserWithUrls>, DirectoryError> {
        let listing: ListUsersResponse = self
            .rpc
            .call(
                ListUsersRequest::KIND,
                &ListUsersRequest {},
                self.timeouts.list,
            )
            .await
            .map_err(DirectoryError::UserListing)?;
        let users = listing.users;

        if users.is_empty() {
            return Ok(Vec::new());
        }
        tracing::info!(count = users.len(), "aggregating users");

        let ids: Vec<AuthUserId> = users.iter().map(|u| u.auth_user_id).collect();
        let auths: HashMap<AuthUserId, AuthRecord> = match self
            .rpc
            .call::<_, GetAuthsByIdsResponse>(
                GetAuthsByIdsRequest::KIND,
                &GetAuthsByIdsRequest { ids },
                self.timeouts.auxiliary,
            )
            .await
        {
            Ok(response) => response
                .auths
                .into_iter()
                .map(|a| (a.auth_user_id, a))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "batched auth lookup failed, defaulting every row");
                HashMap::new()
            }
        };

        let user_ids: Vec<UserId> = users.iter().map(|u| u.user_id).collect();
        let mut urls_by_user: HashMap<UserId, Vec<UrlRecord>> = match self
            .rpc
            .call::<_, GetUrlsByUserIdsResponse>(
                GetUrlsByUserIdsRequest::KIND,
                &GetUrlsByUserIdsRequest { user_ids },
                self.timeouts.auxiliary,
            )
            .await
        {
            Ok(response) => response.urls_by_user,
            Err(e) => {
                tracing::warn!(error = %e, "batched url lookup failed, defaulting every row");
                HashMap::new()
            }
        };

        let rows = users
            .into_iter()
            .map(|user| {
                let (role, is_email_verified) = auths
                    .get(&user.auth_user_id)
                    .map(|a| (a.role.clone(), a.is_email_verified))
                    .unwrap_or_else(|| (DEFAULT_ROLE.to_string(), false));
                let urls = urls_by_user.remove(&user.user_id).unwrap_or_default();
                join_row(user, role, is_email_verified, urls)
            })
            .collect();
        Ok(rows)
    }
}

fn join_row(
    user: UserRecord,
    role: String,
    is_email_verified: bool,
    urls: Vec<UrlRecord>,
) -> UserWithUrls {
    UserWithUrls {
        user_id: user.user_id,
        auth_user_id: user.auth_user_id,
        username: user.username,
        email: user.email,
        role,
        is_email_verified,
        urls,
    }
}
