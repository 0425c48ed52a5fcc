//! HTTP middleware components.
//!
//! Every stage is a [`guard::Guard`]: it either passes the request on or
//! answers it through an [`responder::ErrorHandler`].
//!
//! # Authentication Flow
//!
//! 1. Client sends a request with `Authorization: Key <api-key>`
//! 2. [`authenticate::Authenticator`] validates the key and stores the identity in the request context
//! 3. [`authorize::ClientAuthorizer`] / [`authorize::PermissionCheck`] inspect that identity
//! 4. The handler executes if all checks pass

/// API key authentication middleware
pub mod authenticate;
/// Client and permission authorizers
pub mod authorize;
/// Guard trait, tower layer and middleware function
pub mod guard;
/// Error responders
pub mod responder;

pub use authenticate::{Authenticator, IdentityValidator, ValidateFn, validate_fn};
pub use authorize::{ClientAuthorizer, PermissionCheck, PermissionsAuthorizer};
pub use guard::{Guard, GuardLayer, GuardService, Rejection, guard_middleware};
pub use responder::{ErrorHandler, JsonErrorHandler, StandardErrorHandler};
