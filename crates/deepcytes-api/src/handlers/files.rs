//! File upload and listing handlers.
//!
//! Uploads are validated and measured while streaming; only the metadata is
//! persisted.

use axum::extract::{multipart::MultipartRejection, Multipart, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use deepcytes_core::{
    defaults, parse_int_or, Error, FileMetadata, FilesPagination, NewFileMetadata,
    UploadRejection,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field that carries the upload.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct FilesQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: &'static str,
    pub file: FileMetadata,
}

#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub success: bool,
    pub files: Vec<FileMetadata>,
    pub pagination: FilesPagination,
}

fn malformed(e: impl std::fmt::Display) -> ApiError {
    ApiError::Upload(UploadRejection::Malformed(e.to_string()))
}

/// Last known document-store state, re-probed once when it reads as down.
async fn files_store_ready(state: &AppState) -> bool {
    state.files.is_connected() || state.mongodb.probe().await
}

/// Upload a single CSV, JSON, or Excel file.
///
/// # Multipart Fields
/// - `file`: the file (required, exactly one)
///
/// # Returns
/// - 200 OK with the stored metadata
/// - 400 Bad Request with a `code` for rejected uploads, or when no file was sent
/// - 503 Service Unavailable when the document store is down
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| malformed(e.body_text()))?;
    let policy = state.upload_policy();
    let mut upload: Option<NewFileMetadata> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        // Plain form fields are ignored.
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name != FILE_FIELD {
            return Err(UploadRejection::UnexpectedField { field: field_name }.into());
        }
        if upload.is_some() {
            return Err(UploadRejection::TooManyFiles.into());
        }

        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        policy.check_type(&mime_type)?;

        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(malformed)? {
            size += chunk.len() as u64;
            policy.check_size(size)?;
        }

        debug!(subsystem = "api", op = "upload", file_name = %file_name, mime_type = %mime_type, size, "Accepted file part");
        upload = Some(NewFileMetadata {
            original_name: file_name,
            mime_type,
            size,
        });
    }

    if !files_store_ready(&state).await {
        return Err(ApiError::database_unavailable());
    }
    let Some(upload) = upload else {
        return Err(ApiError::bad_request(
            "No file uploaded",
            "Please select a file to upload",
        ));
    };

    let file = state.files.insert(upload).await.map_err(|e| match e {
        Error::InvalidInput(msg) => ApiError::bad_request("File validation failed", msg),
        Error::Unavailable(_) => ApiError::database_unavailable(),
        other => {
            ApiError::store_failure(other, "File upload failed", "Unable to save file. Please try again.")
        }
    })?;
    info!(subsystem = "api", op = "upload", file_id = %file.id, size = file.size, "File uploaded");

    Ok(Json(UploadResponse {
        success: true,
        message: "File uploaded successfully",
        file,
    }))
}

/// List uploaded file metadata, newest first.
///
/// # Query Parameters
/// - `page`: 1-based page (default 1)
/// - `limit`: page size (default 10, max 100)
///
/// # Returns
/// - 200 OK with files and pagination
/// - 400 Bad Request when `limit` exceeds 100
/// - 503 Service Unavailable when the document store is down
pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<FilesQuery>,
) -> Result<Json<FilesResponse>, ApiError> {
    if !files_store_ready(&state).await {
        return Err(ApiError::database_unavailable());
    }

    let page = parse_int_or(query.page.as_deref(), defaults::PAGE).max(1);
    let mut limit = parse_int_or(query.limit.as_deref(), defaults::PAGE_LIMIT);
    if limit < 1 {
        limit = defaults::PAGE_LIMIT;
    }
    if limit > defaults::FILES_PAGE_MAX {
        return Err(ApiError::bad_request(
            "Invalid limit",
            "Limit cannot exceed 100 files per request",
        ));
    }

    let skip = (page - 1).saturating_mul(limit);
    let result = state
        .files
        .list(skip as u64, limit as u64)
        .await
        .map_err(|e| match e {
            Error::Unavailable(_) => ApiError::database_unavailable(),
            other => ApiError::store_failure(
                other,
                "Could not fetch files",
                "Unable to retrieve file list. Please try again.",
            ),
        })?;

    Ok(Json(FilesResponse {
        success: true,
        pagination: FilesPagination::new(page, limit, result.total),
        files: result.files,
    }))
}
