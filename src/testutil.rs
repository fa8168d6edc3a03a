//! Test doubles: an in-process mock of the Ekadi backend plus a navigator
//! that records where the client core tried to send the user.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use serde_json::{Value, json};

use crate::api::types::{AccountType, User};
use crate::cache::Cache;
use crate::config::ClientConfig;
use crate::http::Transport;
use crate::route::{Navigator, Route};

// =============================================================================
// FIXTURES
// =============================================================================

pub(crate) fn sample_user() -> User {
    User {
        id: 42,
        email: "pat@example.com".to_string(),
        first_name: "Pat".to_string(),
        last_name: "Okafor".to_string(),
        phone_number: Some("+14155550142".to_string()),
        account_type: AccountType::Personal,
        company_name: None,
        bio: Some("Coffee enthusiast.".to_string()),
        picture_url: None,
    }
}

// =============================================================================
// RECORDING NAVIGATOR
// =============================================================================

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn last(&self) -> Option<Route> {
        self.routes.lock().unwrap().last().copied()
    }

    pub(crate) fn all(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn go(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

// =============================================================================
// MOCK BACKEND
// =============================================================================

#[derive(Default)]
pub(crate) struct MockState {
    pub refresh_calls: AtomicUsize,
    /// When false the refresh endpoint answers 401.
    pub refresh_fails: AtomicBool,
    /// When false, protected endpoints answer 401 until a refresh succeeds.
    pub session_valid: AtomicBool,
    /// When true `GET /auth/user/` answers 503.
    pub user_fetch_fails: AtomicBool,
    /// When true `POST /auth/logout/` answers 503.
    pub logout_fails: AtomicBool,
    /// Delay before the refresh endpoint answers, to widen the window in
    /// which concurrent 401s must share one refresh.
    pub refresh_delay_ms: AtomicU64,
}

pub(crate) struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub(crate) async fn spawn() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let state = Arc::new(MockState::default());
        state.session_valid.store(true, Ordering::SeqCst);

        let app = axum::Router::new()
            .route("/auth/login/", post(login))
            .route("/auth/register/", post(register))
            .route("/auth/logout/", post(logout))
            .route("/auth/refresh/", post(refresh))
            .route("/auth/user/", get(current_user))
            .route("/auth/user/update/", patch(update_user))
            .route("/protected/", get(protected))
            .route("/always-401/", get(always_401))
            .route("/forbidden/", get(forbidden))
            .route("/boom/", get(boom))
            .route("/slow/", get(slow))
            .route("/events/", get(list_events).post(create_event))
            .route("/events/dashboard/", get(dashboard))
            .route("/events/{id}/", patch(update_event).delete(delete_event))
            .route("/events/{id}/close/", post(close_event))
            .route("/events/{id}/reopen/", post(reopen_event))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url: format!("http://{addr}"), state }
    }
}

// =============================================================================
// HARNESS
// =============================================================================

pub(crate) struct Harness {
    pub backend: MockBackend,
    pub transport: Arc<Transport>,
    pub cache: Arc<Cache>,
    pub navigator: Arc<RecordingNavigator>,
}

pub(crate) async fn harness() -> Harness {
    let backend = MockBackend::spawn().await;
    let config = ClientConfig::new(&backend.base_url);
    harness_with(backend, &config)
}

pub(crate) fn harness_with(backend: MockBackend, config: &ClientConfig) -> Harness {
    let cache = Arc::new(Cache::in_memory());
    let navigator = RecordingNavigator::new();
    let transport = Arc::new(
        Transport::new(config, Arc::clone(&cache), navigator.clone() as Arc<dyn Navigator>).unwrap(),
    );
    Harness { backend, transport, cache, navigator }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> impl IntoResponse {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body.get("password").and_then(Value::as_str).unwrap_or_default();
    if email == "unverified@example.com" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"code": "email_not_verified", "detail": "Email address not verified."})),
        );
    }
    if email == "pat@example.com" && password == "hunter2" {
        state.session_valid.store(true, Ordering::SeqCst);
        return (StatusCode::OK, Json(json!({"user": sample_user()})));
    }
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"non_field_errors": ["Unable to log in with provided credentials."]})),
    )
}

async fn register(Json(body): Json<Value>) -> impl IntoResponse {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    if email.contains('@') {
        (
            StatusCode::CREATED,
            Json(json!({"message": "Verification email sent.", "user": sample_user()})),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "email": ["Enter a valid email address."],
                "profile": {"phone_number": ["too short"]}
            })),
        )
    }
}

async fn logout(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    if state.logout_fails.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"detail": "unavailable"})));
    }
    state.session_valid.store(false, Ordering::SeqCst);
    (StatusCode::OK, Json(json!({})))
}

async fn refresh(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }
    if state.refresh_fails.load(Ordering::SeqCst) {
        (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Refresh token expired."})))
    } else {
        state.session_valid.store(true, Ordering::SeqCst);
        (StatusCode::OK, Json(json!({})))
    }
}

async fn current_user(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    if state.user_fetch_fails.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"detail": "unavailable"})));
    }
    if !state.session_valid.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated."})));
    }
    (StatusCode::OK, Json(serde_json::to_value(sample_user()).unwrap()))
}

/// The server is the source of truth for the updated record: it applies the
/// patch to the canonical user and always returns the full object.
async fn update_user(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if !state.session_valid.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated."})));
    }
    let mut user = sample_user();
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type.starts_with("application/json") {
        if let Ok(patch) = serde_json::from_slice::<Value>(&body) {
            if let Some(first_name) = patch.get("first_name").and_then(Value::as_str) {
                user.first_name = first_name.to_string();
            }
            if let Some(bio) = patch.get("bio").and_then(Value::as_str) {
                user.bio = Some(bio.to_string());
            }
            match patch.get("account_type").and_then(Value::as_str) {
                Some("business") => user.account_type = AccountType::Business,
                Some("personal") => user.account_type = AccountType::Personal,
                _ => {}
            }
        }
    } else if content_type.starts_with("multipart/form-data") {
        user.picture_url = Some("https://cdn.ekadi.test/p/42.png".to_string());
    }
    (StatusCode::OK, Json(serde_json::to_value(user).unwrap()))
}

async fn protected(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    if state.session_valid.load(Ordering::SeqCst) {
        (StatusCode::OK, Json(json!({"ok": true})))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated."})))
    }
}

async fn always_401() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Invalid token."})))
}

async fn forbidden() -> impl IntoResponse {
    (StatusCode::FORBIDDEN, Json(json!({"detail": "You do not have permission."})))
}

async fn boom() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "boom"})))
}

async fn slow() -> impl IntoResponse {
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    (StatusCode::OK, Json(json!({"ok": true})))
}

// -----------------------------------------------------------------------------
// Event handlers
// -----------------------------------------------------------------------------

fn sample_event_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "title": "Launch party",
        "description": "Snacks provided.",
        "location": "Rooftop",
        "starts_at": "2026-09-12T18:00:00Z",
        "status": status,
        "slug": crate::slug::encode(id),
        "rsvps": {"attending": 12, "declined": 3, "pending": 5}
    })
}

async fn list_events(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    if !state.session_valid.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated."})));
    }
    (StatusCode::OK, Json(json!([sample_event_json(7, "open")])))
}

async fn create_event(Json(body): Json<Value>) -> impl IntoResponse {
    let mut event = sample_event_json(8, "open");
    if let Some(title) = body.get("title").and_then(Value::as_str) {
        event["title"] = json!(title);
    }
    if let Some(starts_at) = body.get("starts_at").and_then(Value::as_str) {
        event["starts_at"] = json!(starts_at);
    }
    event["rsvps"] = json!({"attending": 0, "declined": 0, "pending": 0});
    (StatusCode::CREATED, Json(event))
}

async fn update_event(
    axum::extract::Path(id): axum::extract::Path<i64>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let mut event = sample_event_json(id, "open");
    if let Some(title) = body.get("title").and_then(Value::as_str) {
        event["title"] = json!(title);
    }
    (StatusCode::OK, Json(event))
}

async fn delete_event(axum::extract::Path(_id): axum::extract::Path<i64>) -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

async fn close_event(axum::extract::Path(id): axum::extract::Path<i64>) -> impl IntoResponse {
    (StatusCode::OK, Json(sample_event_json(id, "closed")))
}

async fn reopen_event(axum::extract::Path(id): axum::extract::Path<i64>) -> impl IntoResponse {
    (StatusCode::OK, Json(sample_event_json(id, "open")))
}

async fn dashboard(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    if !state.session_valid.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated."})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "total_events": 4,
            "open_events": 3,
            "total_invites": 120,
            "attending": 64,
            "declined": 18,
            "pending": 38
        })),
    )
}
