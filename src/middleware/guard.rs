//! The common shape of every authentication and authorization stage.
//!
//! A [`Guard`] looks at a request and either hands back the (possibly new)
//! request for the next stage, or rejects it. Rejections are always answered by
//! the guard's error handler; the next stage never runs.
//!
//! Guards can be mounted two ways, and both behave the same:
//!
//! ```ignore
//! // as a tower layer
//! let app = Router::new()
//!     .route("/private", get(handler).layer(client_authorizer.layer()))
//!     .layer(authenticator.layer());
//!
//! // as an axum middleware function
//! let app = Router::new()
//!     .route("/private", get(handler))
//!     .layer(axum::middleware::from_fn_with_state(
//!         Arc::new(authenticator),
//!         guard_middleware::<Authenticator>,
//!     ));
//! ```

use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower::{Layer, Service};

use crate::{error::AuthError, middleware::responder::ErrorHandler};

/// A request the guard refused, with the reason.
pub struct Rejection {
    pub request: Request,
    pub error: AuthError,
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejection")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("error", &self.error)
            .finish()
    }
}

impl Rejection {
    pub fn new(request: Request, error: AuthError) -> Self {
        Self { request, error }
    }

    /// Answer the rejection with `handler`.
    pub fn respond(self, handler: &dyn ErrorHandler) -> Response {
        handler.handle(&self.request, self.error)
    }
}

/// One middleware stage.
#[async_trait]
pub trait Guard: Send + Sync + 'static {
    /// Let the request through (possibly replaced) or reject it.
    async fn check(&self, request: Request) -> Result<Request, Rejection>;

    /// Handler answering this guard's rejections.
    fn error_handler(&self) -> &dyn ErrorHandler;
}

/// Run `guard` and answer a rejection with its error handler.
async fn run_guard<G>(guard: &G, request: Request) -> Result<Request, Response>
where
    G: Guard + ?Sized,
{
    guard
        .check(request)
        .await
        .map_err(|rejection| rejection.respond(guard.error_handler()))
}

/// Axum middleware function running a guard.
///
/// # Usage with axum::middleware::from_fn_with_state
///
/// ```ignore
/// router.layer(middleware::from_fn_with_state(Arc::new(guard), guard_middleware::<MyGuard>))
/// ```
pub async fn guard_middleware<G>(
    State(guard): State<Arc<G>>,
    request: Request,
    next: Next,
) -> Response
where
    G: Guard,
{
    match run_guard(guard.as_ref(), request).await {
        Ok(request) => next.run(request).await,
        Err(response) => response,
    }
}

/// Layer that runs a guard in front of the wrapped service.
pub struct GuardLayer<G> {
    guard: Arc<G>,
}

impl<G> GuardLayer<G> {
    pub fn new(guard: G) -> Self {
        Self {
            guard: Arc::new(guard),
        }
    }

    pub fn from_shared(guard: Arc<G>) -> Self {
        Self { guard }
    }

    pub fn guard(&self) -> &Arc<G> {
        &self.guard
    }
}

impl<G> Clone for GuardLayer<G> {
    fn clone(&self) -> Self {
        Self {
            guard: Arc::clone(&self.guard),
        }
    }
}

impl<S, G> Layer<S> for GuardLayer<G> {
    type Service = GuardService<S, G>;

    fn layer(&self, inner: S) -> Self::Service {
        GuardService {
            inner,
            guard: Arc::clone(&self.guard),
        }
    }
}

/// Service produced by [`GuardLayer`].
pub struct GuardService<S, G> {
    inner: S,
    guard: Arc<G>,
}

impl<S: Clone, G> Clone for GuardService<S, G> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            guard: Arc::clone(&self.guard),
        }
    }
}

impl<S, G> Service<Request> for GuardService<S, G>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    G: Guard,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let guard = Arc::clone(&self.guard);
        // the clone is not ready; keep it and drive the one poll_ready prepared
        let not_ready_inner = self.inner.clone();
        let mut ready_inner = std::mem::replace(&mut self.inner, not_ready_inner);

        Box::pin(async move {
            match run_guard(guard.as_ref(), request).await {
                Ok(request) => ready_inner.call(request).await,
                Err(response) => Ok(response),
            }
        })
    }
}
