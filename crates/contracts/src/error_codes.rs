//! Machine-readable error codes carried by fault replies.

pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
pub const USER_ALREADY_EXISTS: &str = "USER_ALREADY_EXISTS";
pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
pub const RESOURCE_NOT_FOUND: &str = "RESOURCE_NOT_FOUND";
pub const URL_NOT_FOUND: &str = "URL_NOT_FOUND";
pub const DUPLICATE_RESOURCE: &str = "DUPLICATE_RESOURCE";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
pub const EXTERNAL_SERVICE_ERROR: &str = "EXTERNAL_SERVICE_ERROR";
