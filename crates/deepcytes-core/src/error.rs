//! Error types for deepcytes.

use thiserror::Error;

/// Result type alias using deepcytes' Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for deepcytes store and validation operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Credential mismatch
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A backing store is not reachable
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Search engine call failed
    #[error("Search error: {0}")]
    Search(String),

    /// Document store call failed
    #[error("Document store error: {0}")]
    Document(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors that mean "the thing asked for does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Error::Unavailable(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("user abc".to_string());
        assert_eq!(err.to_string(), "Not found: user abc");
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("a@b.co".to_string());
        assert_eq!(err.to_string(), "Conflict: a@b.co");
    }

    #[test]
    fn test_error_display_search() {
        let err = Error::Search("index unavailable".to_string());
        assert_eq!(err.to_string(), "Search error: index unavailable");
    }

    #[test]
    fn test_error_display_document() {
        let err = Error::Document("write concern".to_string());
        assert_eq!(err.to_string(), "Document store error: write concern");
    }

    #[test]
    fn test_error_display_unavailable() {
        let err = Error::Unavailable("mongodb".to_string());
        assert_eq!(err.to_string(), "Unavailable: mongodb");
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("x".into()).is_not_found());
        assert!(!Error::Internal("x".into()).is_not_found());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
