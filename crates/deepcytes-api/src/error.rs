//! HTTP error envelope.
//!
//! Every error response is `{"error": ..., "details": ...}`. Upload rejections
//! add a `code`; unmatched routes add `availableEndpoints`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use deepcytes_core::UploadRejection;

/// Endpoints listed in the route-not-found response.
pub const AVAILABLE_ENDPOINTS: &[&str] = &[
    "GET /health",
    "POST /register",
    "POST /login",
    "POST /change-password",
    "GET /profile/:email",
    "POST /search-history",
    "GET /search-history/:userId",
    "DELETE /search-history/:id",
    "DELETE /search-history/user/:userId",
    "POST /upload",
    "GET /files",
    "GET /users/search",
    "POST /users",
    "GET /users",
    "PATCH /users/:email",
    "PUT /users/:id",
    "DELETE /users/:id",
];

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{error}: {details}")]
    BadRequest { error: String, details: String },

    #[error("{error}: {details}")]
    Unauthorized { error: String, details: String },

    #[error("{error}: {details}")]
    NotFound { error: String, details: String },

    #[error("{error}: {details}")]
    Conflict { error: String, details: String },

    #[error("{error}: {details}")]
    ServiceUnavailable { error: String, details: String },

    #[error("{error}: {details}")]
    Internal { error: String, details: String },

    #[error("{0}")]
    Upload(UploadRejection),

    #[error("Route not found: {method} {path}")]
    RouteNotFound { method: String, path: String },
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::BadRequest {
            error: error.into(),
            details: details.into(),
        }
    }

    pub fn unauthorized(error: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            error: error.into(),
            details: details.into(),
        }
    }

    pub fn not_found(error: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::NotFound {
            error: error.into(),
            details: details.into(),
        }
    }

    pub fn conflict(error: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::Conflict {
            error: error.into(),
            details: details.into(),
        }
    }

    /// 400 `Invalid email format`.
    pub fn invalid_email() -> Self {
        Self::bad_request("Invalid email format", "Please provide a valid email address")
    }

    /// 503 for the file endpoints when the document store is down.
    pub fn database_unavailable() -> Self {
        ApiError::ServiceUnavailable {
            error: "Database unavailable".into(),
            details: "MongoDB connection is not available. Please try again later.".into(),
        }
    }

    /// Log a failed store call and answer 500 with an endpoint-specific message.
    pub fn store_failure(
        source: deepcytes_core::Error,
        error: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let error = error.into();
        tracing::error!(subsystem = "api", error = %source, "{}", error);
        ApiError::Internal {
            error,
            details: details.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } | ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } | ApiError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Fallback mapping for store errors a handler does not translate itself.
impl From<deepcytes_core::Error> for ApiError {
    fn from(err: deepcytes_core::Error) -> Self {
        use deepcytes_core::Error;
        match err {
            Error::NotFound(msg) => ApiError::not_found("Not found", msg),
            Error::Conflict(msg) => ApiError::conflict("Conflict", msg),
            Error::InvalidInput(msg) => ApiError::bad_request("Invalid input", msg),
            Error::Unauthorized(msg) => ApiError::unauthorized("Unauthorized", msg),
            Error::Unavailable(msg) => {
                error!(subsystem = "api", "Dependency unavailable: {}", msg);
                ApiError::ServiceUnavailable {
                    error: "Service unavailable".into(),
                    details: "A backing service is not available. Please try again later.".into(),
                }
            }
            other => ApiError::store_failure(
                other,
                "Internal server error",
                "Something went wrong. Please try again later.",
            ),
        }
    }
}

impl From<UploadRejection> for ApiError {
    fn from(rejection: UploadRejection) -> Self {
        ApiError::Upload(rejection)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonSyntaxError(_) => {
                ApiError::bad_request("Invalid JSON format", "Request body contains malformed JSON")
            }
            JsonRejection::MissingJsonContentType(_) => ApiError::bad_request(
                "Invalid content type",
                "Expected request with `Content-Type: application/json`",
            ),
            other => ApiError::bad_request("Invalid request body", other.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest { error, details }
            | ApiError::Unauthorized { error, details }
            | ApiError::NotFound { error, details }
            | ApiError::Conflict { error, details }
            | ApiError::ServiceUnavailable { error, details }
            | ApiError::Internal { error, details } => json!({
                "error": error,
                "details": details,
            }),
            ApiError::Upload(rejection) => json!({
                "error": rejection.title(),
                "details": rejection.to_string(),
                "code": rejection.code(),
            }),
            ApiError::RouteNotFound { method, path } => json!({
                "error": "Route not found",
                "details": format!("The requested endpoint {} {} does not exist", method, path),
                "availableEndpoints": AVAILABLE_ENDPOINTS,
            }),
        };

        (status, Json(body)).into_response()
    }
}
