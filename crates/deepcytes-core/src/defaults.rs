//! Centralized default constants for the deepcytes backend.
//!
//! Every crate reads shared defaults from here instead of defining its own
//! magic numbers. Organized by domain area.

// =============================================================================
// INDICES & COLLECTIONS
// =============================================================================

/// Search index holding the user directory.
pub const USERS_INDEX: &str = "users";

/// Search index holding registered (auth) accounts.
pub const AUTH_USERS_INDEX: &str = "auth_users";

/// Search index holding per-user search history.
pub const SEARCH_HISTORY_INDEX: &str = "search_history";

/// Document store collection holding uploaded file metadata.
pub const FILES_COLLECTION: &str = "rawdata";

/// Database used when the document store URI names none.
pub const DOCUMENT_DATABASE: &str = "deepcytes";

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page number for paginated list endpoints.
pub const PAGE: i64 = 1;

/// Default page size for `/files` and the user directory.
pub const PAGE_LIMIT: i64 = 10;

/// Maximum `limit` accepted by `/files`.
pub const FILES_PAGE_MAX: i64 = 100;

/// Maximum `size` accepted by the user directory listing.
pub const USERS_PAGE_MAX: i64 = 100;

/// Maximum `size` accepted by the user directory search.
pub const USER_SEARCH_MAX: i64 = 50;

/// Default cap on returned search history entries.
pub const SEARCH_HISTORY_LIMIT: i64 = 50;

// =============================================================================
// VALIDATION & UPLOAD
// =============================================================================

/// Minimum password length (characters).
pub const PASSWORD_MIN_LEN: usize = 6;

/// Default maximum upload size in bytes (5 MiB).
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 4001;

/// Default bind address.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default CORS origin (the Next.js frontend in development).
pub const ALLOWED_ORIGINS: &str = "http://localhost:3000";

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

/// Deadline for closing each store during shutdown.
pub const SHUTDOWN_CLOSE_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// STORES
// =============================================================================

/// Default search engine node.
pub const ES_NODE: &str = "https://127.0.0.1:9200";

/// Default search engine basic-auth user.
pub const ES_USER: &str = "elastic";

/// Timeout for a single search engine call in seconds.
pub const ES_TIMEOUT_SECS: u64 = 30;

/// Default document store URI.
pub const MONGO_URI: &str = "mongodb://localhost:27017/deepcytes";

/// Server selection timeout for the document store in seconds.
pub const MONGO_SERVER_SELECTION_TIMEOUT_SECS: u64 = 5;
