//! # ekadi-client
//!
//! Typed async client for the Ekadi event-invitation backend: account
//! registration and login, profile updates, event CRUD, and dashboard
//! statistics, all over plain HTTP.
//!
//! ARCHITECTURE
//! ============
//! All requests flow through a single [`http::Transport`] that carries the
//! session cookie, normalizes failures into [`error::ApiError`], and runs the
//! automatic refresh-and-retry protocol on expired sessions. On top of that,
//! [`session::SessionStore`] tracks the authenticated user and keeps a local
//! cache in sync. Navigation side effects (where a browser client would
//! redirect) are delegated to the embedder through [`route::Navigator`] —
//! nothing in this crate owns a UI.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod route;
pub mod session;
pub mod slug;

#[cfg(test)]
pub(crate) mod testutil;

pub use cache::Cache;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::Transport;
pub use route::{Navigator, Route};
pub use session::SessionStore;
