//! Upload acceptance policy for `/upload`.
//!
//! Only single CSV, JSON, or Excel files under a configurable size ceiling
//! are accepted. Rejections carry a machine-readable code.

use thiserror::Error;

use crate::defaults::MAX_FILE_SIZE;

/// MIME types accepted for upload.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "text/csv",
    "application/json",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
];

/// Why an upload was refused before reaching the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("Maximum file size is {}MB", format_megabytes(.max_bytes))]
    TooLarge { max_bytes: u64 },

    #[error("Only one file can be uploaded at a time")]
    TooManyFiles,

    #[error("Only CSV, JSON, and Excel files are allowed!")]
    InvalidType { mime_type: String },

    #[error("Unexpected field")]
    UnexpectedField { field: String },

    #[error("{0}")]
    Malformed(String),
}

impl UploadRejection {
    /// Machine-readable code returned alongside the error.
    pub fn code(&self) -> &'static str {
        match self {
            UploadRejection::TooLarge { .. } => "LIMIT_FILE_SIZE",
            UploadRejection::TooManyFiles => "LIMIT_FILE_COUNT",
            UploadRejection::InvalidType { .. } => "INVALID_FILE_TYPE",
            UploadRejection::UnexpectedField { .. } => "LIMIT_UNEXPECTED_FILE",
            UploadRejection::Malformed(_) => "MALFORMED_MULTIPART",
        }
    }

    /// Short human-readable headline.
    pub fn title(&self) -> &'static str {
        match self {
            UploadRejection::TooLarge { .. } => "File too large",
            UploadRejection::TooManyFiles => "Too many files",
            UploadRejection::InvalidType { .. } => "Invalid file type",
            UploadRejection::UnexpectedField { .. } | UploadRejection::Malformed(_) => {
                "File upload error"
            }
        }
    }
}

fn format_megabytes(bytes: &u64) -> String {
    let mb = *bytes as f64 / (1024.0 * 1024.0);
    format!("{}", mb)
}

/// Size and type limits applied to every upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Largest accepted file in bytes.
    pub max_file_size: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

impl UploadPolicy {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    /// Reject MIME types outside [`ALLOWED_MIME_TYPES`].
    pub fn check_type(&self, mime_type: &str) -> Result<(), UploadRejection> {
        if ALLOWED_MIME_TYPES.contains(&mime_type) {
            Ok(())
        } else {
            Err(UploadRejection::InvalidType {
                mime_type: mime_type.to_string(),
            })
        }
    }

    /// Reject payloads larger than the ceiling.
    pub fn check_size(&self, len: u64) -> Result<(), UploadRejection> {
        if len > self.max_file_size {
            Err(UploadRejection::TooLarge {
                max_bytes: self.max_file_size,
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_types() {
        let policy = UploadPolicy::default();
        for mime in ALLOWED_MIME_TYPES {
            assert!(policy.check_type(mime).is_ok(), "{mime} should be allowed");
        }
    }

    #[test]
    fn test_text_plain_rejected() {
        let err = UploadPolicy::default().check_type("text/plain").unwrap_err();
        assert_eq!(err.code(), "INVALID_FILE_TYPE");
        assert_eq!(err.title(), "Invalid file type");
        assert_eq!(err.to_string(), "Only CSV, JSON, and Excel files are allowed!");
    }

    #[test]
    fn test_size_ceiling_is_inclusive() {
        let policy = UploadPolicy::new(10);
        assert!(policy.check_size(10).is_ok());
        let err = policy.check_size(11).unwrap_err();
        assert_eq!(err.code(), "LIMIT_FILE_SIZE");
    }

    #[test]
    fn test_too_large_message_in_megabytes() {
        let err = UploadPolicy::default().check_size(MAX_FILE_SIZE + 1).unwrap_err();
        assert_eq!(err.to_string(), "Maximum file size is 5MB");

        let err = UploadPolicy::new(1024 * 1024 * 3 / 2).check_size(u64::MAX).unwrap_err();
        assert_eq!(err.to_string(), "Maximum file size is 1.5MB");
    }

    #[test]
    fn test_codes_are_distinct() {
        let rejections = [
            UploadRejection::TooLarge { max_bytes: 1 },
            UploadRejection::TooManyFiles,
            UploadRejection::InvalidType {
                mime_type: "x".into(),
            },
            UploadRejection::UnexpectedField { field: "f".into() },
            UploadRejection::Malformed("bad".into()),
        ];
        let mut codes: Vec<_> = rejections.iter().map(|r| r.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), rejections.len());
    }
}
