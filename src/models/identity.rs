//! Identity capabilities and the basic API client.
//!
//! An identity is whatever a validator hands back for a credential. The
//! authorizers never look at concrete types; they ask an identity for one of
//! two narrow capabilities instead:
//!
//! - [`HasIdentifier`]: the identity names a client (used by the client authorizer)
//! - [`HasPermission`]: the identity can answer permission questions (used by the
//!   permissions authorizer)
//!
//! A single type may provide both, as [`BasicApiClient`] does.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::AuthError;

/// Something that identifies a client.
///
/// An empty identifier means "no real identity" and is rejected by the client authorizer.
pub trait HasIdentifier: Send + Sync {
    fn id(&self) -> &str;
}

/// Something that can be asked whether it holds a named permission.
///
/// Real implementations may hit an external system, so the check is async and fallible.
#[async_trait]
pub trait HasPermission: Send + Sync {
    async fn has_permission(&self, permission: &str) -> Result<bool, AuthError>;
}

/// Value stored in a request context by an authenticator.
///
/// Both capabilities default to absent; implement the ones the type supports.
pub trait Identity: Send + Sync + 'static {
    fn as_identifier(&self) -> Option<&dyn HasIdentifier> {
        None
    }

    fn as_permission_source(&self) -> Option<&dyn HasPermission> {
        None
    }
}

/// Minimal identity: an identifier plus a set of permission names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicApiClient {
    id: String,
    permissions: HashSet<String>,
}

impl BasicApiClient {
    pub fn new<I, P>(id: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            id: id.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn permissions(&self) -> &HashSet<String> {
        &self.permissions
    }
}

impl HasIdentifier for BasicApiClient {
    fn id(&self) -> &str {
        &self.id
    }
}

#[async_trait]
impl HasPermission for BasicApiClient {
    async fn has_permission(&self, permission: &str) -> Result<bool, AuthError> {
        Ok(self.permissions.contains(permission))
    }
}

impl Identity for BasicApiClient {
    fn as_identifier(&self) -> Option<&dyn HasIdentifier> {
        Some(self)
    }

    fn as_permission_source(&self) -> Option<&dyn HasPermission> {
        Some(self)
    }
}
