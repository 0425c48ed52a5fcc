//! Collaborators plugged into the middleware.

pub mod key_store;
