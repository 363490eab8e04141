//! Search history handlers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use deepcytes_core::{json_int_or, non_blank, SaveSearchRequest, SearchHistoryEntry};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSearchBody {
    pub user_id: Option<Value>,
    pub query: Option<Value>,
    pub results_count: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct HistoryMessage {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub history: Vec<SearchHistoryEntry>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearHistoryResponse {
    pub success: bool,
    pub message: &'static str,
    pub deleted_count: u64,
}

/// Strings as-is, numbers in their decimal form; anything else is absent.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Record a search, refreshing the existing entry when the query matches.
///
/// # Returns
/// - 200 OK once saved
/// - 400 Bad Request when `userId` or `query` is missing or blank
pub async fn save_search(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SaveSearchBody>,
) -> Result<Json<HistoryMessage>, ApiError> {
    let user_id = text(body.user_id.as_ref());
    let query = text(body.query.as_ref());
    let (Some(user_id), Some(query)) = (
        non_blank(user_id.as_deref()),
        non_blank(query.as_deref()),
    ) else {
        return Err(ApiError::bad_request(
            "Missing required fields",
            "userId and query are required",
        ));
    };

    let request = SaveSearchRequest {
        user_id: user_id.to_string(),
        query: query.to_string(),
        results_count: json_int_or(body.results_count.as_ref(), 0),
        timestamp: Utc::now(),
    };
    let outcome = state.search_history.save(request).await.map_err(|e| {
        ApiError::store_failure(
            e,
            "Failed to save search history",
            "Unable to save search query. Please try again.",
        )
    })?;
    debug!(subsystem = "api", op = "save_search", outcome = ?outcome, "Search saved");

    Ok(Json(HistoryMessage {
        success: true,
        message: "Search query saved successfully",
    }))
}

/// Newest-first search history of a user.
pub async fn list_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let history = state
        .search_history
        .list_for_user(&user_id, state.config.search_history_limit)
        .await
        .map_err(|e| {
            ApiError::store_failure(
                e,
                "Failed to fetch search history",
                "Unable to retrieve search history. Please try again.",
            )
        })?;

    Ok(Json(HistoryResponse {
        success: true,
        total: history.len(),
        history,
    }))
}

/// Delete one history entry.
///
/// # Returns
/// - 200 OK when deleted
/// - 404 Not Found when no such entry exists
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryMessage>, ApiError> {
    let deleted = state.search_history.delete(&id).await.map_err(|e| {
        ApiError::store_failure(
            e,
            "Failed to delete search history item",
            "Unable to delete search history item. Please try again.",
        )
    })?;
    if !deleted {
        return Err(ApiError::not_found(
            "Search history item not found",
            "The specified search history item does not exist",
        ));
    }

    Ok(Json(HistoryMessage {
        success: true,
        message: "Search history item deleted successfully",
    }))
}

/// Delete every history entry of a user. Zero deletions is still a success.
pub async fn clear_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ClearHistoryResponse>, ApiError> {
    let deleted_count = state
        .search_history
        .delete_for_user(&user_id)
        .await
        .map_err(|e| {
            ApiError::store_failure(
                e,
                "Failed to clear search history",
                "Unable to clear search history. Please try again.",
            )
        })?;

    Ok(Json(ClearHistoryResponse {
        success: true,
        message: "All search history cleared successfully",
        deleted_count,
    }))
}
