//! User directory handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use deepcytes_core::{
    defaults, non_blank, normalize_email, parse_int_or, validate_email, DirectoryUser,
    DirectoryUserHit, UpdateOutcome,
};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserMessage {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub success: bool,
    pub message: &'static str,
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPagination {
    pub current_page: i64,
    pub total_hits: u64,
    pub returned_hits: usize,
}

#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub success: bool,
    pub users: Vec<DirectoryUser>,
    pub pagination: ListPagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchUsersResponse {
    pub success: bool,
    pub query: String,
    pub users: Vec<DirectoryUserHit>,
    pub total: u64,
    pub max_score: Option<f64>,
}

/// Email and password present and the email well formed.
fn credentials(body: &UserBody) -> Result<(&str, &str), ApiError> {
    let email = body.email.as_deref().filter(|e| !e.is_empty());
    let password = body.password.as_deref().filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::bad_request(
            "Missing required fields",
            "Email and password are required",
        ));
    };
    if !validate_email(email) {
        return Err(ApiError::invalid_email());
    }
    Ok((email, password))
}

fn user_not_found() -> ApiError {
    ApiError::not_found("User not found", "No user found with the provided ID")
}

/// Page size within `1..=max`; blank or non-positive values use the default.
fn page_size(raw: Option<&str>, max: i64, details: &'static str) -> Result<i64, ApiError> {
    let size = parse_int_or(raw, defaults::PAGE_LIMIT);
    let size = if size < 1 { defaults::PAGE_LIMIT } else { size };
    if size > max {
        return Err(ApiError::bad_request("Invalid size", details));
    }
    Ok(size)
}

/// Full-text search on directory emails.
///
/// # Query Parameters
/// - `q`: search text (required)
/// - `size`: result cap (default 10, max 50)
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchUsersResponse>, ApiError> {
    let Some(query) = non_blank(params.q.as_deref()) else {
        return Err(ApiError::bad_request(
            "Missing search query",
            "Search query (q) parameter is required",
        ));
    };
    let size = page_size(
        params.size.as_deref(),
        defaults::USER_SEARCH_MAX,
        "Size cannot exceed 50 results per search",
    )?;

    let result = state
        .users
        .search_by_email(query, size as u64)
        .await
        .map_err(|e| {
            ApiError::store_failure(e, "Search failed", "Unable to perform search. Please try again.")
        })?;

    Ok(Json(SearchUsersResponse {
        success: true,
        query: query.to_string(),
        users: result.users,
        total: result.total,
        max_score: result.max_score,
    }))
}

/// Add a directory record. Duplicate emails are allowed.
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UserBody>,
) -> Result<Json<CreateUserResponse>, ApiError> {
    let (email, password) = credentials(&body)?;
    let id = state
        .users
        .create(&normalize_email(email), password)
        .await
        .map_err(|e| {
            ApiError::store_failure(e, "Failed to create user", "Unable to create user. Please try again.")
        })?;

    Ok(Json(CreateUserResponse {
        success: true,
        message: "User created successfully",
        id,
    }))
}

/// Page through the directory.
///
/// # Query Parameters
/// - `page`: 1-based page (default 1)
/// - `size`: page size (default 10, max 100)
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    let page = parse_int_or(params.page.as_deref(), defaults::PAGE).max(1);
    let size = page_size(
        params.size.as_deref(),
        defaults::USERS_PAGE_MAX,
        "Size cannot exceed 100 users per request",
    )?;
    let from = (page - 1).saturating_mul(size);

    let result = state
        .users
        .list(from as u64, size as u64)
        .await
        .map_err(|e| {
            ApiError::store_failure(e, "Failed to fetch users", "Unable to retrieve users. Please try again.")
        })?;

    Ok(Json(ListUsersResponse {
        success: true,
        pagination: ListPagination {
            current_page: page,
            total_hits: result.total,
            returned_hits: result.users.len(),
        },
        users: result.users,
    }))
}

/// Replace email and password of a directory record.
///
/// # Returns
/// - 200 OK, with a distinct message when nothing changed
/// - 400 Bad Request on missing fields or malformed email
/// - 404 Not Found when the record does not exist
pub async fn replace_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UserBody>,
) -> Result<Json<UserMessage>, ApiError> {
    let (email, password) = credentials(&body)?;
    let outcome = match state
        .users
        .replace(&id, &normalize_email(email), password)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) if e.is_not_found() => return Err(user_not_found()),
        Err(e) => {
            return Err(ApiError::store_failure(
                e,
                "Failed to update user",
                "Unable to update user. Please try again.",
            ))
        }
    };

    let message = match outcome {
        UpdateOutcome::Noop => "No changes were made (data was identical)",
        UpdateOutcome::Updated => "User updated successfully",
    };
    Ok(Json(UserMessage {
        success: true,
        message,
    }))
}

/// Delete a directory record.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserMessage>, ApiError> {
    let deleted = state.users.delete(&id).await.map_err(|e| {
        ApiError::store_failure(e, "Failed to delete user", "Unable to delete user. Please try again.")
    })?;
    if !deleted {
        return Err(user_not_found());
    }

    Ok(Json(UserMessage {
        success: true,
        message: "User deleted successfully",
    }))
}
