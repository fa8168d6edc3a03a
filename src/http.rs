//! Shared HTTP transport with the session-refresh protocol.
//!
//! ARCHITECTURE
//! ============
//! One `Transport` serves every API call. It carries the session cookie on
//! each request (set up once at construction, never at call sites), turns
//! every failure into an [`ApiError`], and runs the refresh protocol on 401s
//! so calling code never special-cases an expired session.
//!
//! REFRESH PROTOCOL
//! ================
//! The refresh flag is an explicit two-state machine, `Idle` or `Refreshing`,
//! guarded by an async mutex. The first request to see a 401 becomes the
//! refresh leader; requests that 401 while a refresh is in flight enqueue a
//! continuation and wait — N simultaneous 401s issue exactly one refresh
//! call. A successful refresh replays each original request once (marked as
//! a retry so a second 401 propagates instead of looping). A failed refresh
//! rejects the leader and every waiter with the same error, clears the
//! cached user, and requests navigation to the login screen: continuing on a
//! dead session is unsafe.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, oneshot};

use crate::cache::Cache;
use crate::config::ClientConfig;
use crate::error::{self, ApiError};
use crate::route::{Navigator, Route};

pub(crate) const REFRESH_PATH: &str = "/auth/refresh/";

// =============================================================================
// REQUEST DESCRIPTION
// =============================================================================

/// One multipart form field, held as owned data so the request can be
/// rebuilt for a replay.
#[derive(Clone, Debug)]
pub(crate) struct MultipartField {
    pub name: String,
    pub value: PartValue,
}

#[derive(Clone, Debug)]
pub(crate) enum PartValue {
    Text(String),
    File { filename: String, bytes: Vec<u8> },
}

#[derive(Clone, Debug)]
enum Payload {
    Empty,
    Json(Value),
    Multipart(Vec<MultipartField>),
}

/// A rebuildable description of one outgoing request.
struct ApiRequest {
    method: Method,
    path: String,
    payload: Payload,
}

// =============================================================================
// TRANSPORT
// =============================================================================

enum RefreshState {
    Idle,
    /// Continuations of requests that hit a 401 while the refresh was
    /// already in flight, released in arrival order.
    Refreshing(Vec<oneshot::Sender<Result<(), ApiError>>>),
}

type InvalidatedHook = Box<dyn Fn() + Send + Sync>;

pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    cache: Arc<Cache>,
    navigator: Arc<dyn Navigator>,
    refresh: Mutex<RefreshState>,
    /// Observers of terminal session failure, notified before the login
    /// redirect so in-memory session state clears along with the cache.
    invalidated_hooks: std::sync::Mutex<Vec<InvalidatedHook>>,
}

impl Transport {
    /// Build the shared client with cookie support and the configured
    /// timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(
        config: &ClientConfig,
        cache: Arc<Cache>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            cache,
            navigator,
            refresh: Mutex::new(RefreshState::Idle),
            invalidated_hooks: std::sync::Mutex::new(Vec::new()),
        })
    }

    /// Register a hook run when the session terminally fails (a refresh the
    /// protocol could not recover from). The session store registers here so
    /// its in-memory user clears together with the cached record.
    pub fn on_session_invalidated(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.invalidated_hooks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(Box::new(hook));
    }

    // -------------------------------------------------------------------------
    // Typed helpers used by the api modules
    // -------------------------------------------------------------------------

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.execute(&ApiRequest::bare(Method::GET, path)).await?;
        decode(&body)
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let body = self.execute(&ApiRequest::json(Method::POST, path, body)?).await?;
        decode(&body)
    }

    /// POST with no body, for endpoints whose response carries nothing the
    /// client needs (logout).
    pub(crate) async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.execute(&ApiRequest::bare(Method::POST, path)).await?;
        Ok(())
    }

    pub(crate) async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let body = self.execute(&ApiRequest::json(Method::PATCH, path, body)?).await?;
        decode(&body)
    }

    pub(crate) async fn patch_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: Vec<MultipartField>,
    ) -> Result<T, ApiError> {
        let request = ApiRequest {
            method: Method::PATCH,
            path: path.to_string(),
            payload: Payload::Multipart(fields),
        };
        let body = self.execute(&request).await?;
        decode(&body)
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(&ApiRequest::bare(Method::DELETE, path)).await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Dispatch and the refresh protocol
    // -------------------------------------------------------------------------

    /// Send a request, running the refresh-and-replay protocol on a 401.
    /// Callers observe exactly one settlement; the detour is invisible
    /// except for latency.
    async fn execute(&self, request: &ApiRequest) -> Result<String, ApiError> {
        let (status, body) = self.send_once(request).await?;
        if (200..300).contains(&status) {
            return Ok(body);
        }
        if status != 401 {
            return Err(self.normalized(status, &body));
        }

        // First 401 for this request: refresh (or wait on the refresh
        // already in flight), then replay exactly once.
        self.refresh_session().await?;
        let (status, body) = self.send_once(request).await?;
        if (200..300).contains(&status) {
            Ok(body)
        } else {
            // A 401 here means the replay failed even with a fresh session;
            // it propagates as a normal error rather than refreshing again.
            Err(self.normalized(status, &body))
        }
    }

    /// Single-flight session refresh. The caller that finds the machine
    /// `Idle` leads; everyone else waits on the leader's outcome.
    async fn refresh_session(&self) -> Result<(), ApiError> {
        let waiter = {
            let mut state = self.refresh.lock().await;
            match &mut *state {
                RefreshState::Refreshing(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing(Vec::new());
                    None
                }
            }
        };

        if let Some(rx) = waiter {
            // Leader dropped without settling only if the runtime is
            // tearing down; treat it as a dead session.
            return rx.await.unwrap_or(Err(ApiError::Authentication));
        }

        let result = self.call_refresh_endpoint().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "session refresh failed — signing out");
            self.force_logout();
        }

        let waiters = {
            let mut state = self.refresh.lock().await;
            match std::mem::replace(&mut *state, RefreshState::Idle) {
                RefreshState::Refreshing(waiters) => waiters,
                RefreshState::Idle => Vec::new(),
            }
        };
        for tx in waiters {
            let _ = tx.send(result.clone());
        }
        result
    }

    /// The refresh call itself never recurses into the protocol: a 401 here
    /// is terminal.
    async fn call_refresh_endpoint(&self) -> Result<(), ApiError> {
        let (status, body) = self
            .send_once(&ApiRequest::bare(Method::POST, REFRESH_PATH))
            .await?;
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(error::from_response(status, &body))
        }
    }

    /// Terminal session failure: drop the cached user, notify the session
    /// observers, and send the embedder to the login screen.
    fn force_logout(&self) {
        self.cache.clear_user();
        for hook in self
            .invalidated_hooks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
        {
            hook();
        }
        self.navigator.go(Route::Login);
    }

    /// Normalize a non-2xx status, requesting the navigation the status
    /// demands. Permission failures and server errors are not retried.
    fn normalized(&self, status: u16, body: &str) -> ApiError {
        let err = error::from_response(status, body);
        match err {
            ApiError::Authorization => self.navigator.go(Route::Unauthorized),
            ApiError::Server { status: 500 } => self.navigator.go(Route::ServerError),
            _ => {}
        }
        err
    }

    /// One attempt on the wire: build, send, read. Transport-level failures
    /// are normalized here and never trigger the refresh protocol.
    async fn send_once(&self, request: &ApiRequest) -> Result<(u16, String), ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), &url);
        builder = match &request.payload {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(value),
            Payload::Multipart(fields) => builder.multipart(build_form(fields)),
        };

        let response = builder.send().await.map_err(|e| transport_error(&e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(&e))?;
        Ok((status, body))
    }
}

impl ApiRequest {
    fn bare(method: Method, path: &str) -> Self {
        Self { method, path: path.to_string(), payload: Payload::Empty }
    }

    fn json(method: Method, path: &str, body: &impl Serialize) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Decode(format!("request encode failed: {e}")))?;
        Ok(Self { method, path: path.to_string(), payload: Payload::Json(value) })
    }
}

fn build_form(fields: &[MultipartField]) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new();
    for field in fields {
        form = match &field.value {
            PartValue::Text(text) => form.text(field.name.clone(), text.clone()),
            PartValue::File { filename, bytes } => form.part(
                field.name.clone(),
                reqwest::multipart::Part::bytes(bytes.clone()).file_name(filename.clone()),
            ),
        };
    }
    form
}

fn transport_error(e: &reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
