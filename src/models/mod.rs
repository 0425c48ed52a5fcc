//! Data models shared by the middleware and its collaborators.

/// API key records and key file entries
pub mod api_key;
/// Identity capabilities and the basic API client
pub mod identity;
