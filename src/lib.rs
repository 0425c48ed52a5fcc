//! Gatekeeper - authentication and authorization middleware for axum
//!
//! Requests pass through a chain of guards before reaching a handler:
//!
//! - an [`Authenticator`] reads `Authorization: <Scheme> <token>`, resolves the
//!   token through an [`IdentityValidator`] and stores the identity in the
//!   [`RequestContext`]
//! - a [`ClientAuthorizer`] requires an identified client
//! - a [`PermissionsAuthorizer`] requires a list of permissions
//!
//! Every rejection is answered by an [`ErrorHandler`]; [`StandardErrorHandler`]
//! maps failures to 401, 403 and 500 responses.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum, guards mount as tower layers or middleware functions
//! - **Identities**: capability traits ([`HasIdentifier`], [`HasPermission`])
//! - **Credentials**: API keys stored as SHA-256 hashes ([`ApiKeyStore`])

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod jsonio;
pub mod middleware;
pub mod models;
pub mod router;
pub mod services;
pub mod testing;

pub use context::{RequestContext, RequestContextExt};
pub use error::AuthError;
pub use middleware::{
    Authenticator, ClientAuthorizer, ErrorHandler, Guard, GuardLayer, IdentityValidator,
    JsonErrorHandler, PermissionCheck, PermissionsAuthorizer, StandardErrorHandler,
    guard_middleware, validate_fn,
};
pub use models::identity::{BasicApiClient, HasIdentifier, HasPermission, Identity};
pub use router::{AppState, AuthStack, app_router, app_router_with_middleware};
pub use services::key_store::ApiKeyStore;
