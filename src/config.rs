//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use std::path::PathBuf;

use serde::Deserialize;

/// Demo server configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `AUTH_SCHEME` (optional): credential scheme in the Authorization header, defaults to "Key"
/// - `AUTH_CONTEXT_KEY` (optional): context slot for the authenticated client, defaults to "ApiClient"
/// - `API_KEYS_FILE` (optional): JSON file with the accepted API keys
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,

    #[serde(default = "default_context_key")]
    pub auth_context_key: String,

    #[serde(default)]
    pub api_keys_file: Option<PathBuf>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_auth_scheme() -> String {
    "Key".to_string()
}

fn default_context_key() -> String {
    "ApiClient".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: default_port(),
            auth_scheme: default_auth_scheme(),
            auth_context_key: default_context_key(),
            api_keys_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variable values cannot be parsed into expected types.
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: auth_scheme -> AUTH_SCHEME
        envy::from_env::<Config>()
    }
}
