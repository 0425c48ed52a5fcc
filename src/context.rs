//! Request-scoped context carrying identities between middleware stages.
//!
//! A [`RequestContext`] is an immutable chain of `key → identity` entries kept in
//! the request extensions. Adding a value never touches the existing context: it
//! produces a new context layered on top of the old one, so anyone still holding
//! the old context keeps seeing exactly what was there before.

use std::{convert::Infallible, fmt, sync::Arc};

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::models::identity::Identity;

struct Entry {
    key: String,
    value: Arc<dyn Identity>,
    parent: Option<Arc<Entry>>,
}

/// Immutable key-value carrier attached to a request.
///
/// Cloning is cheap (one `Arc`). Lookups see the most recently layered value for a key.
#[derive(Clone, Default)]
pub struct RequestContext {
    head: Option<Arc<Entry>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new context that carries `value` under `key`, layered over `self`.
    #[must_use]
    pub fn with_value(&self, key: impl Into<String>, value: Arc<dyn Identity>) -> Self {
        Self {
            head: Some(Arc::new(Entry {
                key: key.into(),
                value,
                parent: self.head.clone(),
            })),
        }
    }

    /// Look up the value stored under `key`.
    pub fn value(&self, key: &str) -> Option<&Arc<dyn Identity>> {
        let mut entry = self.head.as_deref();
        while let Some(current) = entry {
            if current.key == key {
                return Some(&current.value);
            }
            entry = current.parent.as_deref();
        }
        None
    }

    pub fn contains(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = Vec::new();
        let mut entry = self.head.as_deref();
        while let Some(current) = entry {
            keys.push(current.key.as_str());
            entry = current.parent.as_deref();
        }
        f.debug_struct("RequestContext").field("keys", &keys).finish()
    }
}

/// Read and replace the context of an HTTP request.
pub trait RequestContextExt {
    /// Context attached to the request, or an empty one.
    fn context(&self) -> RequestContext;

    /// Same request, now carrying `context`.
    #[must_use]
    fn with_context(self, context: RequestContext) -> Self;
}

impl<B> RequestContextExt for axum::http::Request<B> {
    fn context(&self) -> RequestContext {
        self.extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default()
    }

    fn with_context(mut self, context: RequestContext) -> Self {
        self.extensions_mut().insert(context);
        self
    }
}

/// Handlers can take the context directly; requests without one get an empty context.
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}
