//! Domain types shared across the auth and event endpoints.

use serde::{Deserialize, Serialize};

/// Whether an account belongs to an individual or an organization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Personal,
    Business,
}

impl AccountType {
    /// The wire spelling, used for multipart form fields where serde's
    /// rename does not apply.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Business => "business",
        }
    }
}

/// The authenticated principal, owned by the backend and cached locally.
///
/// `id` and `email` are immutable after creation; profile fields change via
/// [`UserUpdate`]. State transitions in the session store always replace the
/// whole record, never merge into it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub picture_url: Option<String>,
}

/// Login credentials. Syntactic validation (email shape, non-empty password)
/// belongs to the caller's form layer.
#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Full registration payload.
#[derive(Clone, Debug, Serialize)]
pub struct RegisterData {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_country_code: String,
    pub phone_number: String,
    pub account_type: AccountType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

/// A profile picture to upload alongside a profile update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PictureUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Partial profile update. Absent fields are left untouched server-side; the
/// response always carries the full updated [`User`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// When present the update goes out as multipart instead of JSON.
    #[serde(skip)]
    pub picture: Option<PictureUpload>,
}

/// Event lifecycle state. Closed events stop accepting RSVPs but keep their
/// guest list readable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Open,
    Closed,
}

/// An event as returned by the backend. Timestamps are ISO-8601 strings,
/// passed through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub starts_at: String,
    #[serde(default)]
    pub status: EventStatus,
    /// Obfuscated public identifier, see [`crate::slug`].
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub rsvps: RsvpSummary,
}

/// Aggregate RSVP counts for one event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsvpSummary {
    pub attending: u32,
    pub declined: u32,
    pub pending: u32,
}

/// Payload for creating or editing an event.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EventInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub starts_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

/// Dashboard aggregates across all of the user's events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_events: u32,
    pub open_events: u32,
    pub total_invites: u32,
    pub attending: u32,
    pub declined: u32,
    pub pending: u32,
}
