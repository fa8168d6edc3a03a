//! Authenticated-session state and its lifecycle operations.
//!
//! ARCHITECTURE
//! ============
//! The store is an explicitly constructed value owned by the embedder's
//! composition root — no module-level globals. `is_authenticated` is derived
//! from exactly one thing: whether a current user is present. Every state
//! transition replaces or clears the whole user record; nothing merges.
//!
//! TRADE-OFFS
//! ==========
//! Initialization hydrates optimistically from the local cache before the
//! reconciling server fetch, so a returning user sees their session
//! instantly and a transient network failure never flashes a logged-out
//! state. The price is that the first paint may show a stale record.

use std::sync::{Arc, Mutex, PoisonError};

use crate::api::auth;
use crate::api::types::{Credentials, RegisterData, User, UserUpdate};
use crate::cache::Cache;
use crate::error::ApiError;
use crate::http::Transport;
use crate::route::{Navigator, Route};

struct SessionState {
    user: Option<User>,
    loading: bool,
}

pub struct SessionStore {
    transport: Arc<Transport>,
    cache: Arc<Cache>,
    navigator: Arc<dyn Navigator>,
    state: Arc<Mutex<SessionState>>,
}

impl SessionStore {
    /// Create a store with no user and `loading` set until
    /// [`initialize`](Self::initialize) completes.
    ///
    /// Registers with the transport's session-invalidated hook: a refresh
    /// the 401 protocol cannot recover from clears this store's user along
    /// with the cached record, so the embedder never sees the login screen
    /// while the store still claims authentication.
    #[must_use]
    pub fn new(transport: Arc<Transport>, cache: Arc<Cache>, navigator: Arc<dyn Navigator>) -> Self {
        let state = Arc::new(Mutex::new(SessionState { user: None, loading: true }));
        let invalidated = Arc::clone(&state);
        transport.on_session_invalidated(move || {
            invalidated.lock().unwrap_or_else(PoisonError::into_inner).user = None;
        });
        Self { transport, cache, navigator, state }
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    /// True iff a current user is present. No other field participates.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().user.is_some()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// Run once at startup: hydrate from the cache, then reconcile against
    /// the server. A failed fetch keeps the cached value silently — a
    /// stale-but-present session beats flashing a logged-out state on a
    /// transient failure. `loading` ends false regardless of outcome.
    pub async fn initialize(&self) {
        if let Some(cached) = self.cache.load_user() {
            self.lock().user = Some(cached);
        }
        match auth::current_user(&self.transport).await {
            Ok(user) => self.replace_user(user),
            Err(e) => {
                tracing::debug!(error = %e, "session reconcile fetch failed; keeping cached user");
            }
        }
        self.lock().loading = false;
    }

    /// Log in and navigate to the dashboard. On failure the session state
    /// is untouched and the error propagates for the caller to render.
    /// Concurrent calls are not deduplicated; callers serialize (e.g. by
    /// disabling their submit trigger).
    ///
    /// # Errors
    ///
    /// Propagates the normalized transport error, including
    /// [`ApiError::UnverifiedEmail`].
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let user = auth::login(&self.transport, credentials).await?;
        self.replace_user(user);
        self.navigator.go(Route::Dashboard);
        Ok(())
    }

    /// Register a new account. Success deliberately does not populate the
    /// current user — the account is unusable until its email is verified —
    /// and navigates to the verification-pending screen.
    ///
    /// # Errors
    ///
    /// Propagates the normalized transport error.
    pub async fn register(&self, data: &RegisterData) -> Result<(), ApiError> {
        auth::register(&self.transport, data).await?;
        self.navigator.go(Route::VerifyEmail);
        Ok(())
    }

    /// Log out. The server call is best effort; the local sign-out is
    /// unconditional, so a user can always leave an authenticated state
    /// even with the network unreachable. Both paths converge on a cleared
    /// session and the login screen.
    pub async fn logout(&self) {
        if let Err(e) = auth::logout(&self.transport).await {
            tracing::warn!(error = %e, "server-side logout failed; clearing session anyway");
        }
        self.lock().user = None;
        self.cache.clear_user();
        self.navigator.go(Route::Login);
    }

    /// Apply a partial profile update. On success the current user becomes
    /// exactly the server's returned record — the server owns the shape of
    /// the updated object, so this is never a local merge.
    ///
    /// # Errors
    ///
    /// Propagates the normalized transport error; state is untouched on
    /// failure.
    pub async fn update_user(&self, update: &UserUpdate) -> Result<User, ApiError> {
        let user = auth::update_user(&self.transport, update).await?;
        self.replace_user(user.clone());
        Ok(user)
    }

    /// Background re-fetch of the current user. A failure logs and no-ops;
    /// it never logs the user out itself. The one exception runs deeper:
    /// when the fetch dies because the transport's refresh protocol failed
    /// terminally, the session-invalidated hook has already cleared this
    /// store.
    pub async fn refresh_user_data(&self) {
        match auth::current_user(&self.transport).await {
            Ok(user) => self.replace_user(user),
            Err(e) => {
                tracing::warn!(error = %e, "background user refresh failed");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Remembered login email ("remember me" hint, no security role)
    // -------------------------------------------------------------------------

    pub fn remember_email(&self, email: &str) {
        self.cache.remember_email(email);
    }

    #[must_use]
    pub fn remembered_email(&self) -> Option<String> {
        self.cache.remembered_email()
    }

    pub fn forget_email(&self) {
        self.cache.forget_email();
    }

    /// Whole-object replacement, mirrored into the cache.
    fn replace_user(&self, user: User) {
        self.cache.store_user(&user);
        self.lock().user = Some(user);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
