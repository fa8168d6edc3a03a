//! Error taxonomy and backend-response normalization.
//!
//! ARCHITECTURE
//! ============
//! Normalization happens exactly once, at the transport boundary: every
//! failure a caller sees is an [`ApiError`], never a raw transport error or
//! an unparsed response body. Variants carry only owned data so a single
//! refresh failure can be cloned out to every request queued behind it.

use std::collections::BTreeMap;

use serde_json::Value;

/// Backend error code marking a login attempt against an unverified account.
const UNVERIFIED_EMAIL_CODE: &str = "email_not_verified";

/// Errors surfaced by every client operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No response was received at all.
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded its timeout.
    #[error("request timed out")]
    Timeout,

    /// A 4xx response with a backend-provided message and field errors.
    #[error("{message}")]
    Validation {
        status: u16,
        message: String,
        /// Field name (dotted for one level of nesting, e.g.
        /// `profile.phone_number`) to its error messages.
        fields: BTreeMap<String, Vec<String>>,
    },

    /// The account exists but its email address is not verified yet.
    #[error("email address not verified")]
    UnverifiedEmail,

    /// A 401 that survived the refresh protocol; the session is dead.
    #[error("authentication required")]
    Authentication,

    /// A 403; the session is alive but lacks permission.
    #[error("permission denied")]
    Authorization,

    /// A 500 from the backend.
    #[error("server error (status {status})")]
    Server { status: u16 },

    /// A response body that should have deserialized but did not.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    /// Any status this taxonomy has no better name for.
    #[error("unexpected response (status {status})")]
    Unknown { status: u16 },
}

impl ApiError {
    /// Status code per the normalization contract: 408 for timeouts,
    /// otherwise the HTTP status. 0 covers every failure that never
    /// produced an HTTP response — network loss, but also local ones
    /// (encode/decode, client construction).
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Network(_) | Self::Decode(_) | Self::ClientBuild(_) => 0,
            Self::Timeout => 408,
            Self::Validation { status, .. } | Self::Server { status } | Self::Unknown { status } => *status,
            Self::UnverifiedEmail => 400,
            Self::Authentication => 401,
            Self::Authorization => 403,
        }
    }
}

/// Normalize a non-2xx response into an [`ApiError`].
///
/// The body is parsed as JSON when possible; a body that is not JSON (or not
/// an object) degrades to the generic fallback message.
#[must_use]
pub fn from_response(status: u16, body: &str) -> ApiError {
    match status {
        401 => ApiError::Authentication,
        403 => ApiError::Authorization,
        500..=599 => ApiError::Server { status },
        400..=499 => {
            let parsed = serde_json::from_str::<Value>(body).ok();
            if parsed.as_ref().is_some_and(is_unverified_email) {
                return ApiError::UnverifiedEmail;
            }
            let fields = parsed.as_ref().map(extract_fields).unwrap_or_default();
            let message = parsed
                .as_ref()
                .and_then(extract_message)
                .unwrap_or_else(|| format!("Request failed with status {status}"));
            ApiError::Validation { status, message, fields }
        }
        _ => ApiError::Unknown { status },
    }
}

/// Whether a 4xx body marks the unverified-email case.
///
/// The typed `code` field is authoritative; the substring fallback covers
/// backend deployments that still only emit prose.
fn is_unverified_email(body: &Value) -> bool {
    if body.get("code").and_then(Value::as_str) == Some(UNVERIFIED_EMAIL_CODE) {
        return true;
    }
    extract_message(body).is_some_and(|m| m.to_ascii_lowercase().contains("not verified"))
}

/// Pull a human-readable message out of a backend error body.
///
/// Extraction order: explicit `detail`/`error`/`message` string wins; then
/// joined `non_field_errors`; then one `"Field Name: message"` line per
/// field error (objects flattened one level); otherwise nothing.
fn extract_message(body: &Value) -> Option<String> {
    let obj = body.as_object()?;

    for key in ["detail", "error", "message"] {
        if let Some(text) = obj.get(key).and_then(Value::as_str) {
            return Some(text.to_string());
        }
    }

    if let Some(errors) = obj.get("non_field_errors").and_then(Value::as_array) {
        let joined: Vec<&str> = errors.iter().filter_map(Value::as_str).collect();
        if !joined.is_empty() {
            return Some(joined.join("\n"));
        }
    }

    let mut lines = Vec::new();
    for (field, value) in obj {
        if field == "code" || field == "non_field_errors" {
            continue;
        }
        match value {
            Value::Object(nested) => {
                for (inner, errors) in nested {
                    push_field_lines(&mut lines, inner, errors);
                }
            }
            _ => push_field_lines(&mut lines, field, value),
        }
    }
    if lines.is_empty() { None } else { Some(lines.join("\n")) }
}

fn push_field_lines(lines: &mut Vec<String>, field: &str, errors: &Value) {
    let label = field_label(field);
    match errors {
        Value::Array(items) => {
            for item in items.iter().filter_map(Value::as_str) {
                lines.push(format!("{label}: {item}"));
            }
        }
        Value::String(item) => lines.push(format!("{label}: {item}")),
        _ => {}
    }
}

/// Structured field-error map, with nested objects flattened to dotted keys.
fn extract_fields(body: &Value) -> BTreeMap<String, Vec<String>> {
    let mut fields = BTreeMap::new();
    let Some(obj) = body.as_object() else {
        return fields;
    };
    for (field, value) in obj {
        if matches!(field.as_str(), "code" | "detail" | "error" | "message") {
            continue;
        }
        match value {
            Value::Object(nested) => {
                for (inner, errors) in nested {
                    insert_field(&mut fields, format!("{field}.{inner}"), errors);
                }
            }
            _ => insert_field(&mut fields, field.clone(), value),
        }
    }
    fields
}

fn insert_field(fields: &mut BTreeMap<String, Vec<String>>, key: String, errors: &Value) {
    let messages: Vec<String> = match errors {
        Value::Array(items) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        Value::String(item) => vec![item.clone()],
        _ => Vec::new(),
    };
    if !messages.is_empty() {
        fields.insert(key, messages);
    }
}

/// `"phone_number"` → `"Phone Number"`.
fn field_label(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
