//! URL service contracts.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A short URL owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlRecord {
    pub id: Uuid,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expire_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Lists the short URLs of a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUrlsByUserRequest {
    pub user_id: UserId,
}

impl GetUrlsByUserRequest {
    pub const KIND: &'static str = "GetUrlsByUser";
}

/// Reply to [`GetUrlsByUserRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUrlsByUserResponse {
    pub urls: Vec<UrlRecord>,
}

/// Lists the short URLs of a batch of users in one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUrlsByUserIdsRequest {
    pub user_ids: Vec<UserId>,
}

impl GetUrlsByUserIdsRequest {
    pub const KIND: &'static str = "GetUrlsByUserIds";
}

/// Reply to [`GetUrlsByUserIdsRequest`], keyed by owning user.
///
/// Users without URLs are absent from the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUrlsByUserIdsResponse {
    pub urls_by_user: HashMap<UserId, Vec<UrlRecord>>,
}
