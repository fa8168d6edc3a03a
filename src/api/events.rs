//! Event CRUD and dashboard statistics.
//!
//! Plain REST calls with no special protocol; the transport's refresh
//! handling applies to these like everything else.

use crate::error::ApiError;
use crate::http::Transport;

use super::types::{DashboardStats, Event, EventInput};

/// `GET /events/`.
///
/// # Errors
///
/// Propagates the normalized transport error.
pub async fn list(transport: &Transport) -> Result<Vec<Event>, ApiError> {
    transport.get("/events/").await
}

/// `GET /events/{id}/`.
///
/// # Errors
///
/// Propagates the normalized transport error.
pub async fn get(transport: &Transport, id: i64) -> Result<Event, ApiError> {
    transport.get(&format!("/events/{id}/")).await
}

/// `POST /events/`.
///
/// # Errors
///
/// Propagates the normalized transport error.
pub async fn create(transport: &Transport, input: &EventInput) -> Result<Event, ApiError> {
    transport.post("/events/", input).await
}

/// `PATCH /events/{id}/`.
///
/// # Errors
///
/// Propagates the normalized transport error.
pub async fn update(transport: &Transport, id: i64, input: &EventInput) -> Result<Event, ApiError> {
    transport.patch(&format!("/events/{id}/"), input).await
}

/// `POST /events/{id}/close/`. Closed events stop accepting RSVPs.
///
/// # Errors
///
/// Propagates the normalized transport error.
pub async fn close(transport: &Transport, id: i64) -> Result<Event, ApiError> {
    transport.post(&format!("/events/{id}/close/"), &serde_json::json!({})).await
}

/// `POST /events/{id}/reopen/`.
///
/// # Errors
///
/// Propagates the normalized transport error.
pub async fn reopen(transport: &Transport, id: i64) -> Result<Event, ApiError> {
    transport.post(&format!("/events/{id}/reopen/"), &serde_json::json!({})).await
}

/// `DELETE /events/{id}/`.
///
/// # Errors
///
/// Propagates the normalized transport error.
pub async fn delete(transport: &Transport, id: i64) -> Result<(), ApiError> {
    transport.delete(&format!("/events/{id}/")).await
}

/// `GET /events/dashboard/` — aggregates across all of the user's events.
///
/// # Errors
///
/// Propagates the normalized transport error.
pub async fn dashboard(transport: &Transport) -> Result<DashboardStats, ApiError> {
    transport.get("/events/dashboard/").await
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
