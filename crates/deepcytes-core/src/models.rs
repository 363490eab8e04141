//! Domain models shared by the store adapters and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// AUTH ACCOUNTS (index `auth_users`)
// =============================================================================

/// A registered account as stored in the auth index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Engine-assigned document id.
    pub id: String,
    /// Lowercased email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Display name, empty when never set.
    pub name: String,
}

impl AuthUser {
    /// Fields that are safe to return to clients.
    pub fn profile(&self) -> AuthProfile {
        AuthProfile {
            email: self.email.clone(),
            name: self.name.clone(),
            id: self.id.clone(),
        }
    }
}

/// Request to register a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthUser {
    /// Already-lowercased email.
    pub email: String,
    pub password: String,
    /// Trimmed name, empty when absent.
    pub name: String,
}

/// Public projection of an account (never carries the password).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProfile {
    pub email: String,
    pub name: String,
    pub id: String,
}

// =============================================================================
// USER DIRECTORY (index `users`)
// =============================================================================

/// A directory user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub email: String,
    pub password: String,
}

/// A directory user returned by a relevance search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryUserHit {
    #[serde(flatten)]
    pub user: DirectoryUser,
    pub score: Option<f64>,
}

/// One page of the directory listing.
#[derive(Debug, Clone, Default)]
pub struct DirectoryPage {
    pub users: Vec<DirectoryUser>,
    /// Total number of directory records.
    pub total: u64,
}

/// Result of a directory email search.
#[derive(Debug, Clone, Default)]
pub struct DirectorySearchResult {
    pub users: Vec<DirectoryUserHit>,
    pub total: u64,
    pub max_score: Option<f64>,
}

/// Outcome of an update that the engine may report as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// Stored data was identical to the requested update.
    Noop,
}

// =============================================================================
// FILE METADATA (collection `rawdata`)
// =============================================================================

/// Metadata of an uploaded file. The payload itself is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Metadata to persist for a freshly uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileMetadata {
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
}

/// One page of file metadata, newest first.
#[derive(Debug, Clone, Default)]
pub struct FilePage {
    pub files: Vec<FileMetadata>,
    /// Total number of stored files.
    pub total: u64,
}

/// Pagination block of the `/files` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesPagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_files: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl FilesPagination {
    /// Compute the pagination block for `page` (1-based) of `limit` items.
    pub fn new(page: i64, limit: i64, total_files: u64) -> Self {
        let total = i64::try_from(total_files).unwrap_or(i64::MAX);
        let skip = page.saturating_sub(1).saturating_mul(limit);
        let total_pages = if limit > 0 {
            total.saturating_add(limit - 1) / limit
        } else {
            0
        };
        Self {
            current_page: page,
            total_pages,
            total_files,
            has_next: skip.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }
}

// =============================================================================
// SEARCH HISTORY (index `search_history`)
// =============================================================================

/// A stored search, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub id: String,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub results_count: i64,
}

/// Request to record a search for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSearchRequest {
    pub user_id: String,
    /// Trimmed query text.
    pub query: String,
    pub results_count: i64,
    pub timestamp: DateTime<Utc>,
}

/// Whether saving a search touched an existing record or created one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted(String),
    Updated(String),
}

impl SaveOutcome {
    /// Id of the record that now holds the search.
    pub fn id(&self) -> &str {
        match self {
            SaveOutcome::Inserted(id) | SaveOutcome::Updated(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_pagination_second_page_of_fifteen() {
        let p = FilesPagination::new(2, 10, 15);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.total_files, 15);
        assert!(!p.has_next);
        assert!(p.has_prev);
    }

    #[test]
    fn test_files_pagination_first_page() {
        let p = FilesPagination::new(1, 10, 15);
        assert!(p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_files_pagination_empty() {
        let p = FilesPagination::new(1, 10, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_files_pagination_exact_multiple() {
        let p = FilesPagination::new(2, 10, 20);
        assert_eq!(p.total_pages, 2);
        assert!(!p.has_next);
    }

    #[test]
    fn test_files_pagination_huge_page_saturates() {
        let p = FilesPagination::new(i64::MAX, 10, 15);
        assert_eq!(p.current_page, i64::MAX);
        assert_eq!(p.total_pages, 2);
        assert!(!p.has_next);
        assert!(p.has_prev);

        let p = FilesPagination::new(1, 100, u64::MAX);
        assert!(p.has_next);
    }

    #[test]
    fn test_files_pagination_serializes_camel_case() {
        let json = serde_json::to_value(FilesPagination::new(1, 10, 3)).unwrap();
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["totalFiles"], 3);
        assert_eq!(json["hasNext"], false);
        assert_eq!(json["hasPrev"], false);
    }

    #[test]
    fn test_profile_omits_password() {
        let user = AuthUser {
            id: "abc".into(),
            email: "a@b.co".into(),
            password: "secret1".into(),
            name: "Ann".into(),
        };
        let json = serde_json::to_value(user.profile()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "a@b.co");
        assert_eq!(json["id"], "abc");
    }

    #[test]
    fn test_directory_hit_flattens_user() {
        let hit = DirectoryUserHit {
            user: DirectoryUser {
                id: "1".into(),
                email: "x@y.io".into(),
                password: "pw".into(),
            },
            score: Some(1.5),
        };
        let json = serde_json::to_value(hit).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["email"], "x@y.io");
        assert_eq!(json["score"], 1.5);
    }

    #[test]
    fn test_save_outcome_id() {
        assert_eq!(SaveOutcome::Inserted("a".into()).id(), "a");
        assert_eq!(SaveOutcome::Updated("b".into()).id(), "b");
    }
}
