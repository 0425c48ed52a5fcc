//! Error types and HTTP error response handling.
//!
//! This module defines the failures the authentication and authorization
//! middleware can report, and how the standard policy turns them into
//! HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Failure reported by an authenticator, an authorizer or one of their collaborators.
///
/// # Error Categories
///
/// - **Authentication**: no usable identity where one is required
/// - **Authorization**: an identity exists but is not allowed through
/// - **Contract**: a collaborator broke its contract with the middleware
/// - **Other**: anything a validator or permission source reports on its own
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No valid identity is present where one is required.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("authentication required")]
    AuthenticationRequired,

    /// An identity is present but structurally invalid (e.g. an empty identifier).
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("authorization failed")]
    AuthorizationFailed,

    /// The identity is valid but lacks the named permission.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("permission denied: {permission}")]
    PermissionDenied { permission: String },

    /// A validator reported success without producing an identity.
    ///
    /// Returns HTTP 500 Internal Server Error.
    #[error("authenticator returned no identity, should return an error instead")]
    ValidatorContractViolation,

    /// Opaque failure propagated from a validator or permission source.
    ///
    /// Returns HTTP 500 Internal Server Error (details are never sent to the client).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AuthError {
    /// Wrap an arbitrary message as an opaque collaborator failure.
    pub fn internal(message: impl std::fmt::Display) -> Self {
        AuthError::Other(anyhow::anyhow!("{message}"))
    }

    /// Name of the permission that was denied, if this is a permission failure.
    pub fn permission(&self) -> Option<&str> {
        match self {
            AuthError::PermissionDenied { permission } => Some(permission),
            _ => None,
        }
    }

    /// Status code under the standard policy.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            AuthError::AuthorizationFailed | AuthError::PermissionDenied { .. } => {
                StatusCode::FORBIDDEN
            }
            AuthError::ValidatorContractViolation | AuthError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to the client under the standard policy.
    pub fn public_message(&self) -> &'static str {
        match self.status_code() {
            StatusCode::UNAUTHORIZED => "Authentication required",
            StatusCode::FORBIDDEN => "Access denied",
            _ => "Internal error",
        }
    }
}

/// Convert AuthError into an HTTP response using the standard policy.
///
/// # Status Code Mapping
///
/// - `AuthenticationRequired` → 401 "Authentication required"
/// - `AuthorizationFailed` → 403 "Access denied"
/// - `PermissionDenied` → 403 "Access denied"
/// - anything else → 500 "Internal error"
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status_code(), self.public_message()).into_response()
    }
}
