//! Repository traits for the two backing stores.
//!
//! The HTTP layer only sees these traits, so handlers can run against the
//! Elasticsearch/MongoDB adapters in production and in-memory fakes in tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// SEARCH ENGINE REPOSITORIES
// =============================================================================

/// Registered accounts.
#[async_trait]
pub trait AuthUserRepository: Send + Sync {
    /// Exact lookup by (already lowercased) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>>;

    /// Insert the account unless one with the same email exists.
    ///
    /// Returns the new id, or `None` when the email is taken. The existence
    /// check and the insert are two separate store calls, so two concurrent
    /// registrations of one email can both succeed.
    async fn create_if_absent(&self, user: NewAuthUser) -> Result<Option<String>>;

    /// Replace the stored password. `Error::NotFound` when the id is unknown.
    async fn update_password(&self, id: &str, password: &str) -> Result<()>;

    /// Replace the display name and return the re-fetched account.
    async fn update_name(&self, id: &str, name: &str) -> Result<AuthUser>;
}

/// The loosely related user directory.
#[async_trait]
pub trait UserDirectoryRepository: Send + Sync {
    /// Insert a record without any duplicate check; returns the new id.
    async fn create(&self, email: &str, password: &str) -> Result<String>;

    /// Page through all records.
    async fn list(&self, from: u64, size: u64) -> Result<DirectoryPage>;

    /// Full-text search on the email field, with relevance scores.
    async fn search_by_email(&self, query: &str, size: u64) -> Result<DirectorySearchResult>;

    /// Replace email and password. `Error::NotFound` when the id is unknown.
    async fn replace(&self, id: &str, email: &str, password: &str) -> Result<UpdateOutcome>;

    /// Delete by id; `false` when nothing was deleted.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Per-user search history.
#[async_trait]
pub trait SearchHistoryRepository: Send + Sync {
    /// Upsert by `(user_id, full-text match on query)`.
    ///
    /// Match-then-write is not atomic: concurrent saves of one query may
    /// insert more than one record.
    async fn save(&self, request: SaveSearchRequest) -> Result<SaveOutcome>;

    /// Newest-first history for a user, at most `limit` entries.
    async fn list_for_user(&self, user_id: &str, limit: u64) -> Result<Vec<SearchHistoryEntry>>;

    /// Delete one entry; `false` when it does not exist.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Delete every entry of a user; returns the number deleted.
    async fn delete_for_user(&self, user_id: &str) -> Result<u64>;
}

// =============================================================================
// DOCUMENT STORE REPOSITORY
// =============================================================================

/// Uploaded file metadata.
#[async_trait]
pub trait FileMetadataRepository: Send + Sync {
    /// Last known connection state, without a round trip.
    fn is_connected(&self) -> bool;

    /// Persist metadata; `uploaded_at` is set to the insertion time.
    async fn insert(&self, file: NewFileMetadata) -> Result<FileMetadata>;

    /// Newest-first page plus the total count.
    async fn list(&self, skip: u64, limit: u64) -> Result<FilePage>;
}

// =============================================================================
// HEALTH
// =============================================================================

/// A dependency that can report whether it is reachable.
#[async_trait]
pub trait ServiceProbe: Send + Sync {
    /// Name used in the health report (`mongodb`, `elasticsearch`).
    fn service_name(&self) -> &'static str;

    /// Round-trip check; also refreshes any cached connection state.
    async fn probe(&self) -> bool;
}
