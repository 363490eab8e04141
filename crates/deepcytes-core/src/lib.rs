//! # deepcytes-core
//!
//! Core types, traits, and validation helpers for the deepcytes backend.
//!
//! This crate has no knowledge of Elasticsearch, MongoDB, or HTTP. The store
//! adapters in `deepcytes-db` implement the repository traits defined here and
//! the `deepcytes-api` handlers consume them.

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;
pub mod upload;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use upload::{UploadPolicy, UploadRejection, ALLOWED_MIME_TYPES};
pub use validation::{
    json_int_or, non_blank, normalize_email, parse_int_or, validate_email, validate_password,
};
