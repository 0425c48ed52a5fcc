//! Authorization middleware.
//!
//! Authorizers run after an authenticator and only read the request context:
//!
//! - [`ClientAuthorizer`] requires an identity with a non-empty identifier
//! - [`PermissionsAuthorizer`] builds per-route [`PermissionCheck`]s requiring a
//!   list of permissions, checked in order and stopping at the first denial

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;

use crate::{
    context::{RequestContext, RequestContextExt},
    error::AuthError,
    middleware::{
        guard::{Guard, GuardLayer, Rejection},
        responder::ErrorHandler,
    },
};

/// Requires an identified client in the request context.
pub struct ClientAuthorizer {
    context_key: String,
    error_handler: Arc<dyn ErrorHandler>,
}

impl ClientAuthorizer {
    pub fn new(context_key: impl Into<String>, error_handler: impl ErrorHandler) -> Self {
        Self::with_shared(context_key, Arc::new(error_handler))
    }

    pub fn with_shared(
        context_key: impl Into<String>,
        error_handler: Arc<dyn ErrorHandler>,
    ) -> Self {
        Self {
            context_key: context_key.into(),
            error_handler,
        }
    }

    pub fn layer(self) -> GuardLayer<Self> {
        GuardLayer::new(self)
    }

    fn authorize(&self, request: &Request) -> Result<(), AuthError> {
        let context = request.context();
        let client = context
            .value(&self.context_key)
            .and_then(|identity| identity.as_identifier())
            .ok_or(AuthError::AuthenticationRequired)?;

        if client.id().is_empty() {
            return Err(AuthError::AuthorizationFailed);
        }
        Ok(())
    }
}

#[async_trait]
impl Guard for ClientAuthorizer {
    async fn check(&self, request: Request) -> Result<Request, Rejection> {
        match self.authorize(&request) {
            Ok(()) => Ok(request),
            Err(error) => Err(Rejection::new(request, error)),
        }
    }

    fn error_handler(&self) -> &dyn ErrorHandler {
        self.error_handler.as_ref()
    }
}

/// Factory for permission checks sharing one context slot and error handler.
#[derive(Clone)]
pub struct PermissionsAuthorizer {
    context_key: Arc<str>,
    error_handler: Arc<dyn ErrorHandler>,
}

impl PermissionsAuthorizer {
    pub fn new(context_key: impl Into<String>, error_handler: impl ErrorHandler) -> Self {
        Self::with_shared(context_key, Arc::new(error_handler))
    }

    pub fn with_shared(
        context_key: impl Into<String>,
        error_handler: Arc<dyn ErrorHandler>,
    ) -> Self {
        Self {
            context_key: Arc::from(context_key.into()),
            error_handler,
        }
    }

    /// Guard requiring every permission in `permissions`, checked in the given order.
    ///
    /// An empty list only requires a permission-checkable identity.
    pub fn guard<I, P>(&self, permissions: I) -> PermissionCheck
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        PermissionCheck {
            context_key: Arc::clone(&self.context_key),
            error_handler: Arc::clone(&self.error_handler),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Layer requiring every permission in `permissions`.
    pub fn require<I, P>(&self, permissions: I) -> GuardLayer<PermissionCheck>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        GuardLayer::new(self.guard(permissions))
    }
}

/// Guard requiring a fixed list of permissions.
pub struct PermissionCheck {
    context_key: Arc<str>,
    error_handler: Arc<dyn ErrorHandler>,
    permissions: Vec<String>,
}

impl PermissionCheck {
    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    async fn authorize(&self, context: &RequestContext) -> Result<(), AuthError> {
        // must actually have something to check; if not, the request was never authenticated
        let source = context
            .value(&self.context_key)
            .and_then(|identity| identity.as_permission_source())
            .ok_or(AuthError::AuthenticationRequired)?;

        for permission in &self.permissions {
            if !source.has_permission(permission).await? {
                return Err(AuthError::PermissionDenied {
                    permission: permission.clone(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Guard for PermissionCheck {
    async fn check(&self, request: Request) -> Result<Request, Rejection> {
        let context = request.context();
        match self.authorize(&context).await {
            Ok(()) => Ok(request),
            Err(error) => Err(Rejection::new(request, error)),
        }
    }

    fn error_handler(&self) -> &dyn ErrorHandler {
        self.error_handler.as_ref()
    }
}
