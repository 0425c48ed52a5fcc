//! Error responders: turn an [`AuthError`] into the response sent to the client.

use axum::{extract::Request, response::Response};

use crate::{error::AuthError, jsonio};

/// Called by a guard when it rejects a request. The returned response ends the chain.
///
/// Any `Fn(&Request, AuthError) -> Response` is an error handler.
pub trait ErrorHandler: Send + Sync + 'static {
    fn handle(&self, request: &Request, error: AuthError) -> Response;
}

impl<F> ErrorHandler for F
where
    F: Fn(&Request, AuthError) -> Response + Send + Sync + 'static,
{
    fn handle(&self, request: &Request, error: AuthError) -> Response {
        self(request, error)
    }
}

/// Standard policy: 401/403/500 with short plain-text bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardErrorHandler;

impl ErrorHandler for StandardErrorHandler {
    fn handle(&self, request: &Request, error: AuthError) -> Response {
        log_rejection(request, &error);
        axum::response::IntoResponse::into_response(error)
    }
}

/// Same status codes as the standard policy, with a JSON `{"errors": [...]}` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorHandler;

impl ErrorHandler for JsonErrorHandler {
    fn handle(&self, request: &Request, error: AuthError) -> Response {
        log_rejection(request, &error);
        jsonio::respond_errors(error.status_code(), [error.public_message()])
    }
}

fn log_rejection(request: &Request, error: &AuthError) {
    let method = request.method();
    let path = request.uri().path();
    match error {
        AuthError::ValidatorContractViolation | AuthError::Other(_) => {
            tracing::error!(%method, path, error = %error, "auth middleware failed");
        }
        _ => {
            tracing::warn!(%method, path, error = %error, "request rejected");
        }
    }
}
