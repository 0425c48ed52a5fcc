//! Greeting endpoint.

use axum::extract::State;

use crate::{context::RequestContext, router::AppState};

/// Greets the authenticated client by id, or the world when there is none.
pub async fn greet(State(state): State<AppState>, context: RequestContext) -> String {
    let client = context
        .value(&state.context_key)
        .and_then(|identity| identity.as_identifier());

    match client {
        Some(client) => format!("Hello {}", client.id()),
        None => "Hello world!".to_string(),
    }
}
