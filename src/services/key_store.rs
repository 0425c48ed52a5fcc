//! In-memory API key store.
//!
//! The store is an explicit collaborator handed to an
//! [`Authenticator`](crate::middleware::Authenticator), so several independent
//! stores (and authenticators) can live in one process.

use std::{collections::HashMap, path::Path, sync::Arc};

use async_trait::async_trait;

use crate::{
    error::AuthError,
    middleware::authenticate::IdentityValidator,
    models::{
        api_key::{ApiKey, ApiKeyEntry, hash_key},
        identity::{BasicApiClient, Identity},
    },
};

/// Failure loading an API key file.
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("failed to read key file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid key file: {0}")]
    Json(#[from] serde_json::Error),
}

/// API keys indexed by the SHA-256 of the raw key.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyStore {
    keys: HashMap<String, ApiKey>,
}

impl ApiKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load keys from a JSON file holding a list of [`ApiKeyEntry`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid key list.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, KeyStoreError> {
        let contents = std::fs::read(path)?;
        let entries: Vec<ApiKeyEntry> = serde_json::from_slice(&contents)?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ApiKeyEntry>) -> Self {
        let mut store = Self::new();
        for entry in entries {
            let client_id = entry.client_id.unwrap_or_else(|| entry.key.clone());
            store.insert(client_id, &entry.key, entry.permissions);
            if !entry.active {
                store.revoke(&entry.key);
            }
        }
        store
    }

    /// Register `raw_key` for `client_id`. Re-inserting a key replaces its record.
    pub fn insert<I, P>(&mut self, client_id: impl Into<String>, raw_key: &str, permissions: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let key_hash = hash_key(raw_key);
        let record = ApiKey {
            client_id: client_id.into(),
            key_hash: key_hash.clone(),
            permissions: permissions.into_iter().map(Into::into).collect(),
            is_active: true,
        };
        self.keys.insert(key_hash, record);
    }

    /// Builder form of [`ApiKeyStore::insert`].
    #[must_use]
    pub fn with_key<I, P>(
        mut self,
        client_id: impl Into<String>,
        raw_key: &str,
        permissions: I,
    ) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.insert(client_id, raw_key, permissions);
        self
    }

    /// Deactivate `raw_key`. Returns false if the key is unknown.
    pub fn revoke(&mut self, raw_key: &str) -> bool {
        match self.keys.get_mut(&hash_key(raw_key)) {
            Some(record) => {
                record.is_active = false;
                true
            }
            None => false,
        }
    }

    /// Active record for `raw_key`.
    pub fn lookup(&self, raw_key: &str) -> Option<&ApiKey> {
        self.keys
            .get(&hash_key(raw_key))
            .filter(|record| record.is_active)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl IdentityValidator for ApiKeyStore {
    async fn validate(&self, token: &str) -> Result<Option<Arc<dyn Identity>>, AuthError> {
        let record = self
            .lookup(token)
            .ok_or(AuthError::AuthenticationRequired)?;

        let identity: Arc<dyn Identity> = Arc::new(BasicApiClient::new(
            record.client_id.clone(),
            record.permissions.iter().cloned(),
        ));
        Ok(Some(identity))
    }
}
