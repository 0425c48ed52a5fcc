//! Application router with public and private routes.
//!
//! Some private routes only need an authenticated client, others also need
//! permissions. Two builders produce the same application:
//!
//! - [`app_router`] mounts every stage as a tower layer
//! - [`app_router_with_middleware`] mounts every stage through
//!   [`axum::middleware::from_fn_with_state`]

use std::sync::Arc;

use axum::{
    Router,
    handler::Handler,
    middleware::from_fn_with_state,
    routing::{MethodRouter, get, post},
};

use crate::{
    handlers::{greeting::greet, health::health_check},
    middleware::{
        Authenticator, ClientAuthorizer, ErrorHandler, IdentityValidator, PermissionCheck,
        PermissionsAuthorizer, StandardErrorHandler, guard_middleware,
    },
};

/// Permissions needed to list users.
pub const USERS_READ: &[&str] = &["users.read"];
/// Permissions needed to create users.
pub const USERS_WRITE: &[&str] = &["users.read", "users.write"];

/// State shared with all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Context slot the authenticated client is stored under
    pub context_key: Arc<str>,
}

impl AppState {
    pub fn new(context_key: impl Into<String>) -> Self {
        Self {
            context_key: Arc::from(context_key.into()),
        }
    }
}

/// Collaborators every auth stage of the application is built from.
#[derive(Clone)]
pub struct AuthStack {
    scheme: String,
    context_key: String,
    validator: Arc<dyn IdentityValidator>,
    error_handler: Arc<dyn ErrorHandler>,
}

impl AuthStack {
    /// Stack answering rejections with [`StandardErrorHandler`].
    pub fn new(
        scheme: impl Into<String>,
        context_key: impl Into<String>,
        validator: impl IdentityValidator,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            context_key: context_key.into(),
            validator: Arc::new(validator),
            error_handler: Arc::new(StandardErrorHandler),
        }
    }

    #[must_use]
    pub fn with_error_handler(mut self, error_handler: impl ErrorHandler) -> Self {
        self.error_handler = Arc::new(error_handler);
        self
    }

    pub fn context_key(&self) -> &str {
        &self.context_key
    }

    fn authenticator(&self) -> Authenticator {
        Authenticator::with_shared(
            &self.scheme,
            &self.context_key,
            Arc::clone(&self.error_handler),
            Arc::clone(&self.validator),
        )
    }

    fn client_authorizer(&self) -> ClientAuthorizer {
        ClientAuthorizer::with_shared(&self.context_key, Arc::clone(&self.error_handler))
    }

    fn permissions_authorizer(&self) -> PermissionsAuthorizer {
        PermissionsAuthorizer::with_shared(&self.context_key, Arc::clone(&self.error_handler))
    }
}

/// Build the application with every stage mounted as a tower layer.
///
/// The authenticator wraps the whole router; authorizers wrap single routes and
/// never run for methods a route does not handle.
pub fn app_router(auth: &AuthStack) -> Router {
    let client = auth.client_authorizer();
    let perms = auth.permissions_authorizer();

    let private_users = get(greet.layer(perms.require(USERS_READ.iter().copied())))
        .post(greet.layer(perms.require(USERS_WRITE.iter().copied())));

    Router::new()
        .route("/public", get(greet))
        .route("/private", get(greet).route_layer(client.layer()))
        .route("/private/users", private_users)
        // every route above sees the authenticated client
        .layer(auth.authenticator().layer())
        .route("/health", get(health_check))
        .with_state(AppState::new(auth.context_key()))
}

/// Build the same application with middleware functions.
///
/// Private routes run the client authorizer first, then their permission check.
pub fn app_router_with_middleware(auth: &AuthStack) -> Router {
    let client = Arc::new(auth.client_authorizer());
    let perms = auth.permissions_authorizer();

    let private_users = permission_route(get(greet), perms.guard(USERS_READ.iter().copied()))
        .merge(permission_route(
            post(greet),
            perms.guard(USERS_WRITE.iter().copied()),
        ))
        .route_layer(from_fn_with_state(
            Arc::clone(&client),
            guard_middleware::<ClientAuthorizer>,
        ));

    Router::new()
        .route("/public", get(greet))
        .route(
            "/private",
            get(greet).route_layer(from_fn_with_state(
                client,
                guard_middleware::<ClientAuthorizer>,
            )),
        )
        .route("/private/users", private_users)
        .layer(from_fn_with_state(
            Arc::new(auth.authenticator()),
            guard_middleware::<Authenticator>,
        ))
        .route("/health", get(health_check))
        .with_state(AppState::new(auth.context_key()))
}

fn permission_route(
    route: MethodRouter<AppState>,
    check: PermissionCheck,
) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(
        Arc::new(check),
        guard_middleware::<PermissionCheck>,
    ))
}
