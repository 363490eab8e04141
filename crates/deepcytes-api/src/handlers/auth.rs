//! Account registration, login, password change, and profile handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use deepcytes_core::{
    non_blank, normalize_email, validate_email, validate_password, AuthProfile, NewAuthUser,
};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// `name` stays untyped so a non-string value is reported as an invalid name.
#[derive(Debug, Deserialize)]
pub struct UpdateNameRequest {
    pub name: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub message: &'static str,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub email: String,
    pub name: String,
    pub id: String,
    /// Opaque bearer token; nothing verifies it yet.
    pub token: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UpdateNameResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: AuthProfile,
}

/// Empty strings count as missing, like absent fields.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn user_not_found() -> ApiError {
    ApiError::not_found("User not found", "No user found with the provided email address")
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Register a new account.
///
/// # Returns
/// - 201 Created with the new account id
/// - 400 Bad Request on missing fields, malformed email, or short password
/// - 409 Conflict if the email is already registered
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let (Some(email), Some(password)) = (present(&body.email), present(&body.password)) else {
        return Err(ApiError::bad_request(
            "Missing required fields",
            "Email and password are required",
        ));
    };
    if !validate_email(email) {
        return Err(ApiError::invalid_email());
    }
    if !validate_password(Some(password)) {
        return Err(ApiError::bad_request(
            "Invalid password",
            "Password must be at least 6 characters long",
        ));
    }

    let new_user = NewAuthUser {
        email: normalize_email(email),
        password: password.to_string(),
        name: non_blank(body.name.as_deref()).unwrap_or_default().to_string(),
    };
    let created = state
        .auth_users
        .create_if_absent(new_user)
        .await
        .map_err(|e| {
            ApiError::store_failure(
                e,
                "Registration failed",
                "Unable to create user account. Please try again.",
            )
        })?;

    match created {
        Some(id) => {
            info!(subsystem = "api", op = "register", user_id = %id, "Account registered");
            Ok((
                StatusCode::CREATED,
                Json(CreatedResponse {
                    success: true,
                    message: "User created successfully",
                    id,
                }),
            ))
        }
        None => Err(ApiError::conflict(
            "User already exists",
            "An account with this email address already exists",
        )),
    }
}

/// Check credentials and hand out a session token.
///
/// # Returns
/// - 200 OK with the profile and a token
/// - 400 Bad Request on missing fields or malformed email
/// - 401 Unauthorized when the account is unknown or the password differs
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(email), Some(password)) = (present(&body.email), present(&body.password)) else {
        return Err(ApiError::bad_request(
            "Missing credentials",
            "Email and password are required",
        ));
    };
    if !validate_email(email) {
        return Err(ApiError::invalid_email());
    }

    let user = state
        .auth_users
        .find_by_email(&normalize_email(email))
        .await
        .map_err(|e| {
            ApiError::store_failure(e, "Login failed", "Unable to authenticate. Please try again.")
        })?;

    let invalid = || ApiError::unauthorized("Invalid credentials", "Email or password is incorrect");
    let user = user.ok_or_else(invalid)?;
    if user.password != password {
        debug!(subsystem = "api", op = "login", user_id = %user.id, "Password mismatch");
        return Err(invalid());
    }

    Ok(Json(LoginResponse {
        email: user.email,
        name: user.name,
        id: user.id,
        token: Uuid::new_v4().to_string(),
        message: "Login successful",
    }))
}

/// Replace an account password after checking the current one.
///
/// # Returns
/// - 200 OK on success
/// - 400 Bad Request on missing fields, malformed email, or short new password
/// - 401 Unauthorized when the current password differs
/// - 404 Not Found when the account does not exist
pub async fn change_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (Some(email), Some(current), Some(new_password)) = (
        present(&body.email),
        present(&body.current_password),
        present(&body.new_password),
    ) else {
        return Err(ApiError::bad_request(
            "Missing required fields",
            "Email, current password, and new password are required",
        ));
    };
    if !validate_email(email) {
        return Err(ApiError::invalid_email());
    }
    if !validate_password(Some(new_password)) {
        return Err(ApiError::bad_request(
            "Invalid new password",
            "New password must be at least 6 characters long",
        ));
    }

    let failure = |e| {
        ApiError::store_failure(
            e,
            "Failed to change password",
            "Unable to change password. Please try again.",
        )
    };
    let user = state
        .auth_users
        .find_by_email(&normalize_email(email))
        .await
        .map_err(failure)?
        .ok_or_else(user_not_found)?;

    if user.password != current {
        return Err(ApiError::unauthorized(
            "Current password is incorrect",
            "The current password you entered does not match our records",
        ));
    }

    match state.auth_users.update_password(&user.id, new_password).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => return Err(user_not_found()),
        Err(e) => return Err(failure(e)),
    }
    info!(subsystem = "api", op = "change_password", user_id = %user.id, "Password changed");

    Ok(Json(MessageResponse {
        success: true,
        message: "Password changed successfully",
    }))
}

/// Fetch the public profile of an account.
///
/// # Returns
/// - 200 OK with `{email, name, id}`
/// - 400 Bad Request on malformed email
/// - 404 Not Found when the account does not exist
pub async fn get_profile(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<AuthProfile>, ApiError> {
    if !validate_email(&email) {
        return Err(ApiError::invalid_email());
    }

    let user = state
        .auth_users
        .find_by_email(&normalize_email(&email))
        .await
        .map_err(|e| {
            ApiError::store_failure(
                e,
                "Failed to fetch profile",
                "Unable to retrieve user profile. Please try again.",
            )
        })?
        .ok_or_else(user_not_found)?;

    Ok(Json(user.profile()))
}

/// Change the display name of an account (`PATCH /users/:email`).
///
/// # Returns
/// - 200 OK with the updated profile
/// - 400 Bad Request on malformed email or a missing/blank name
/// - 404 Not Found when the account does not exist
pub async fn update_name(
    State(state): State<AppState>,
    Path(email): Path<String>,
    ApiJson(body): ApiJson<UpdateNameRequest>,
) -> Result<Json<UpdateNameResponse>, ApiError> {
    if !validate_email(&email) {
        return Err(ApiError::invalid_email());
    }
    let Some(name) = non_blank(body.name.as_ref().and_then(Value::as_str)) else {
        return Err(ApiError::bad_request(
            "Invalid name",
            "Name is required and must be a non-empty string",
        ));
    };

    let failure = |e| {
        ApiError::store_failure(
            e,
            "Failed to update username",
            "Unable to update username. Please try again.",
        )
    };
    let user = state
        .auth_users
        .find_by_email(&normalize_email(&email))
        .await
        .map_err(failure)?
        .ok_or_else(user_not_found)?;

    let updated = match state.auth_users.update_name(&user.id, name).await {
        Ok(updated) => updated,
        Err(e) if e.is_not_found() => return Err(user_not_found()),
        Err(e) => return Err(failure(e)),
    };

    Ok(Json(UpdateNameResponse {
        success: true,
        message: "Username updated successfully",
        user: updated.profile(),
    }))
}
