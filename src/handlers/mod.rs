//! HTTP request handlers (route handlers).
//!
//! The auth stages run before these; a handler only reads what they left in the
//! request context.

/// Greeting endpoint shared by the public and private routes
pub mod greeting;
/// Health check endpoint
pub mod health;
