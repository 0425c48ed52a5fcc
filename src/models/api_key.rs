//! API Key model for authentication.
//!
//! API keys identify clients calling the API. The store only keeps SHA-256
//! hashes of the keys, never the keys themselves.

use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Represents an API key known to an [`ApiKeyStore`](crate::services::key_store::ApiKeyStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    /// Identifier handed to the identity built for this key
    pub client_id: String,

    /// SHA-256 hash of the actual API key (64 hex characters)
    ///
    /// When a request comes in with "Key abc123", we:
    /// 1. Hash "abc123" with SHA-256
    /// 2. Look up this hash in the store
    /// 3. If found and active, authenticate the request
    pub key_hash: String,

    /// Permission names granted to the client
    pub permissions: Vec<String>,

    /// Whether this API key is currently active
    ///
    /// Inactive keys are rejected during authentication. This provides a way to revoke access without forgetting the record.
    pub is_active: bool,
}

/// One entry of an API key file.
///
/// # Example
///
/// ```json
/// [
///   { "key": "good-key-1", "permissions": ["users.read", "users.write"] },
///   { "key": "s3cr3t", "client_id": "billing", "permissions": [], "active": false }
/// ]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyEntry {
    pub key: String,

    /// Defaults to the key itself
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub permissions: Vec<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Hex encoded SHA-256 of a raw API key.
pub fn hash_key(raw_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_key.as_bytes());

    hex::encode(hasher.finalize())
}
