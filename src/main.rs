//! Gatekeeper demo server - Main Application Entry Point
//!
//! Serves a small application with public and private routes protected by API
//! key authentication and permission checks.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Load the API key store
//! 3. Build HTTP router with routes and auth middleware
//! 4. Start server on configured port

use gatekeeper::{ApiKeyStore, AuthStack, app_router, config::Config};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let store = match &config.api_keys_file {
        Some(path) => {
            let store = ApiKeyStore::from_json_file(path)?;
            tracing::info!(keys = store.len(), path = %path.display(), "API keys loaded");
            store
        }
        None => {
            tracing::warn!("API_KEYS_FILE not set, every API key will be rejected");
            ApiKeyStore::new()
        }
    };

    let auth = AuthStack::new(&config.auth_scheme, &config.auth_context_key, store);

    let app = app_router(&auth)
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http());

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
