//! Authentication and profile endpoints.

use serde::Deserialize;

use crate::error::ApiError;
use crate::http::{MultipartField, PartValue, Transport};

use super::types::{Credentials, RegisterData, User, UserUpdate};

#[derive(Deserialize)]
struct LoginResponse {
    user: User,
}

/// Registration response. The user record is echoed back but the account is
/// unusable until the email is verified.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
}

/// `POST /auth/login/`. The backend sets the session cookie on success.
///
/// # Errors
///
/// Propagates the normalized transport error, including
/// [`ApiError::UnverifiedEmail`] for accounts pending verification.
pub async fn login(transport: &Transport, credentials: &Credentials) -> Result<User, ApiError> {
    let resp: LoginResponse = transport.post("/auth/login/", credentials).await?;
    Ok(resp.user)
}

/// `POST /auth/register/`. Success does not establish a session.
///
/// # Errors
///
/// Propagates the normalized transport error; field errors for the
/// registration form arrive as [`ApiError::Validation`].
pub async fn register(transport: &Transport, data: &RegisterData) -> Result<RegisterResponse, ApiError> {
    transport.post("/auth/register/", data).await
}

/// `POST /auth/logout/`. Clears the session cookie server-side.
///
/// # Errors
///
/// Propagates the normalized transport error. Callers treat this as best
/// effort; see [`crate::session::SessionStore::logout`].
pub async fn logout(transport: &Transport) -> Result<(), ApiError> {
    transport.post_empty("/auth/logout/").await
}

/// `GET /auth/user/`.
///
/// # Errors
///
/// Propagates the normalized transport error.
pub async fn current_user(transport: &Transport) -> Result<User, ApiError> {
    transport.get("/auth/user/").await
}

/// `PATCH /auth/user/update/`, as JSON, or multipart when a picture upload
/// is attached. Returns the full updated record.
///
/// # Errors
///
/// Propagates the normalized transport error.
pub async fn update_user(transport: &Transport, update: &UserUpdate) -> Result<User, ApiError> {
    match &update.picture {
        None => transport.patch("/auth/user/update/", update).await,
        Some(picture) => {
            let mut fields = text_fields(update);
            fields.push(MultipartField {
                name: "picture".to_string(),
                value: PartValue::File {
                    filename: picture.filename.clone(),
                    bytes: picture.bytes.clone(),
                },
            });
            transport.patch_multipart("/auth/user/update/", fields).await
        }
    }
}

/// Flatten the update's set fields into multipart text parts.
fn text_fields(update: &UserUpdate) -> Vec<MultipartField> {
    let pairs = [
        ("first_name", &update.first_name),
        ("last_name", &update.last_name),
        ("phone_number", &update.phone_number),
        ("company_name", &update.company_name),
        ("bio", &update.bio),
    ];
    let mut fields: Vec<MultipartField> = pairs
        .into_iter()
        .filter_map(|(name, value)| {
            value.as_ref().map(|text| MultipartField {
                name: name.to_string(),
                value: PartValue::Text(text.clone()),
            })
        })
        .collect();
    if let Some(account_type) = update.account_type {
        fields.push(MultipartField {
            name: "account_type".to_string(),
            value: PartValue::Text(account_type.as_str().to_string()),
        });
    }
    fields
}
