//! Message contracts shared between the onboarding services.
//!
//! Every cross-service message is defined here: the commands and reply
//! events of the onboarding saga, the request/response pairs used by the
//! directory aggregation and the account deletion workflow, and the DTOs
//! they carry. Services exchange these types only; none of them share a
//! database.

pub mod auth;
pub mod error_codes;
pub mod saga;
pub mod urls;
pub mod users;

pub use auth::{
    AuthRecord, DeleteAuthRequest, DeleteAuthResponse, GetAuthByIdRequest, GetAuthsByIdsRequest,
    GetAuthsByIdsResponse,
};
pub use saga::{
    AssignRoleCommand, CreateCredentialCommand, CreateProfileCommand, CredentialCreated,
    CredentialCreationFailed, ConfirmationDelivered, OnboardingCommand, OnboardingEvent,
    ProfileCreated, ProfileCreationFailed, RoleAssigned, SendConfirmationCommand,
    StartOnboarding, UserWithUrls, DEFAULT_ROLE,
};
pub use urls::{GetUrlsByUserIdsRequest, GetUrlsByUserIdsResponse, GetUrlsByUserRequest, GetUrlsByUserResponse, UrlRecord};
pub use users::{DeleteUserRequest, DeleteUserResponse, GetUserRequest, ListUsersRequest, ListUsersResponse, UserRecord};
