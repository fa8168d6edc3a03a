//! Navigation seam between this crate and the embedding application.
//!
//! ARCHITECTURE
//! ============
//! The transport and session store sometimes need to move the user somewhere
//! (login after a dead session, the error screen on a 500). A browser client
//! would hard-redirect; this crate only reports the destination through
//! [`Navigator`] and lets the embedder decide what a redirect means.

/// Destinations the client core can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Authenticated landing page, entered after a successful login.
    Dashboard,
    /// Login screen, entered after logout or a terminal session failure.
    Login,
    /// "Check your inbox" screen shown after registration.
    VerifyEmail,
    /// Permission-denied screen (HTTP 403).
    Unauthorized,
    /// Generic error screen (HTTP 500).
    ServerError,
}

/// Receives navigation requests from the client core.
///
/// Implementations must be cheap and non-blocking; they are called from
/// request paths.
pub trait Navigator: Send + Sync {
    fn go(&self, route: Route);
}

/// Navigator that ignores every request, for embedders with no routing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn go(&self, _route: Route) {}
}
