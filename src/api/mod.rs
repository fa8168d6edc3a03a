//! Typed wrappers over the Ekadi backend's REST endpoints.
//!
//! ARCHITECTURE
//! ============
//! Endpoint modules own wire shapes and paths so the session store and
//! embedding applications only see domain types. Everything dispatches
//! through the shared [`crate::http::Transport`], which handles credentials,
//! error normalization, and the session-refresh protocol.

pub mod auth;
pub mod events;
pub mod types;
