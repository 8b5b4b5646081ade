//! User service contracts.

use common::{AuthUserId, UserId};
use serde::{Deserialize, Serialize};

/// Looks up a single user profile by ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserRequest {
    pub user_id: UserId,
}

impl GetUserRequest {
    pub const KIND: &'static str = "GetUser";
}

/// A user profile record. Doubles as the reply to [`GetUserRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub auth_user_id: AuthUserId,
    pub username: String,
    pub email: String,
}

/// Lists every user profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersRequest {}

impl ListUsersRequest {
    pub const KIND: &'static str = "ListUsers";
}

/// Reply to [`ListUsersRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserRecord>,
}

/// Deletes a user profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserRequest {
    pub user_id: UserId,
}

impl DeleteUserRequest {
    pub const KIND: &'static str = "DeleteUser";
}

/// Reply to [`DeleteUserRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub success: bool,
}
