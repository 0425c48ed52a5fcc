//! API key authentication middleware.
//!
//! This middleware looks at every request to:
//! 1. Extract the credential from the `Authorization: <Scheme> <token>` header
//! 2. Hand the token to an [`IdentityValidator`]
//! 3. Attach the returned identity to a new request context
//!
//! A request without a credential (or with some other scheme) is passed on
//! untouched; rejecting anonymous requests is the authorizers' job.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{HeaderMap, header},
};

use crate::{
    context::RequestContextExt,
    error::AuthError,
    middleware::{
        guard::{Guard, GuardLayer, Rejection},
        responder::ErrorHandler,
    },
    models::identity::Identity,
};

/// Resolves a credential token to an identity.
///
/// Returning `Ok(None)` breaks the contract: a successful validation must produce
/// an identity. The authenticator reports it as
/// [`AuthError::ValidatorContractViolation`].
#[async_trait]
pub trait IdentityValidator: Send + Sync + 'static {
    async fn validate(&self, token: &str) -> Result<Option<Arc<dyn Identity>>, AuthError>;
}

/// Adapter turning an async closure into an [`IdentityValidator`].
pub struct ValidateFn<F>(F);

/// Use `f` as a validator.
///
/// ```ignore
/// let validator = validate_fn(|token: String| async move {
///     if token == "good-api-key" {
///         Ok(Some(Arc::new(BasicApiClient::new(token, ["users.read"])) as Arc<dyn Identity>))
///     } else {
///         Err(AuthError::AuthenticationRequired)
///     }
/// });
/// ```
pub fn validate_fn<F, Fut>(f: F) -> ValidateFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Arc<dyn Identity>>, AuthError>> + Send,
{
    ValidateFn(f)
}

#[async_trait]
impl<F, Fut> IdentityValidator for ValidateFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Arc<dyn Identity>>, AuthError>> + Send,
{
    async fn validate(&self, token: &str) -> Result<Option<Arc<dyn Identity>>, AuthError> {
        (self.0)(token.to_owned()).await
    }
}

/// Authenticating guard.
pub struct Authenticator {
    scheme: String,
    context_key: String,
    error_handler: Arc<dyn ErrorHandler>,
    validator: Arc<dyn IdentityValidator>,
}

impl Authenticator {
    /// # Arguments
    ///
    /// * `scheme` - expected first word of the `Authorization` header (e.g. "Key")
    /// * `context_key` - slot the identity is stored under
    /// * `error_handler` - answers failed validations
    /// * `validator` - resolves tokens to identities
    pub fn new(
        scheme: impl Into<String>,
        context_key: impl Into<String>,
        error_handler: impl ErrorHandler,
        validator: impl IdentityValidator,
    ) -> Self {
        Self::with_shared(
            scheme,
            context_key,
            Arc::new(error_handler),
            Arc::new(validator),
        )
    }

    /// Like [`Authenticator::new`], for collaborators shared with other guards.
    pub fn with_shared(
        scheme: impl Into<String>,
        context_key: impl Into<String>,
        error_handler: Arc<dyn ErrorHandler>,
        validator: Arc<dyn IdentityValidator>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            context_key: context_key.into(),
            error_handler,
            validator,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn context_key(&self) -> &str {
        &self.context_key
    }

    pub fn layer(self) -> GuardLayer<Self> {
        GuardLayer::new(self)
    }
}

#[async_trait]
impl Guard for Authenticator {
    async fn check(&self, request: Request) -> Result<Request, Rejection> {
        let Some(token) = extract_token(request.headers(), &self.scheme) else {
            return Ok(request);
        };
        let token = token.to_owned();

        let identity = match self.validator.validate(&token).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                return Err(Rejection::new(request, AuthError::ValidatorContractViolation));
            }
            Err(error) => return Err(Rejection::new(request, error)),
        };

        let context = request.context().with_value(&self.context_key, identity);
        Ok(request.with_context(context))
    }

    fn error_handler(&self) -> &dyn ErrorHandler {
        self.error_handler.as_ref()
    }
}

/// Extracts the token from an `Authorization: <scheme> <token>` header.
///
/// Anything else (missing header, other scheme, extra or empty parts) yields `None`.
fn extract_token<'a>(headers: &'a HeaderMap, scheme: &str) -> Option<&'a str> {
    let value = headers.get(header::AUTHORIZATION)?;
    let Ok(value) = value.to_str() else {
        tracing::debug!("Authorization header is not visible ASCII, ignoring");
        return None;
    };

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [found, token] if *found == scheme && !token.is_empty() => Some(*token),
        _ => {
            tracing::debug!(scheme, "no matching credential in Authorization header");
            None
        }
    }
}
