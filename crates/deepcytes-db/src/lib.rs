//! # deepcytes-db
//!
//! Store adapters for the deepcytes backend.
//!
//! This crate provides:
//! - A thin Elasticsearch REST client and idempotent index provisioning
//! - Search-engine repositories for accounts, the user directory, and search history
//! - A MongoDB store for uploaded file metadata
//! - In-memory repositories for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use deepcytes_db::{Database, ElasticConfig, MongoConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect(&ElasticConfig::from_env(), &MongoConfig::from_env()).await?;
//!     db.provision().await?;
//!     Ok(())
//! }
//! ```

pub mod auth_users;
pub mod config;
pub mod elastic;
pub mod files;
pub mod indices;
pub mod memory;
pub mod search_history;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

pub use auth_users::EsAuthUserRepository;
pub use config::{ElasticConfig, MongoConfig};
pub use elastic::{ClusterHealth, ElasticClient};
pub use files::MongoFileStore;
pub use indices::provision_indices;
pub use memory::{InMemoryProbe, InMemoryStore};
pub use search_history::EsSearchHistoryRepository;
pub use users::EsUserDirectoryRepository;

// Re-export core types for convenience
pub use deepcytes_core::*;

/// Both backing stores and the repositories built on them.
pub struct Database {
    /// Search engine client shared by the index repositories.
    pub elastic: Arc<ElasticClient>,
    /// File metadata store.
    pub files: Arc<MongoFileStore>,
    pub auth_users: Arc<EsAuthUserRepository>,
    pub users: Arc<EsUserDirectoryRepository>,
    pub search_history: Arc<EsSearchHistoryRepository>,
}

impl Database {
    /// Build both store clients. No network round trip is made.
    pub async fn connect(elastic: &ElasticConfig, mongo: &MongoConfig) -> Result<Self> {
        let client = Arc::new(ElasticClient::new(elastic)?);
        let files = Arc::new(MongoFileStore::connect(mongo).await?);

        Ok(Self {
            auth_users: Arc::new(EsAuthUserRepository::new(client.clone())),
            users: Arc::new(EsUserDirectoryRepository::new(client.clone())),
            search_history: Arc::new(EsSearchHistoryRepository::new(client.clone())),
            elastic: client,
            files,
        })
    }

    /// Create any missing index ahead of the first request.
    pub async fn provision(&self) -> Result<()> {
        self.elastic.ensure_indices().await
    }

    /// Close both stores. Both are attempted even when the first fails;
    /// the first failure is returned.
    pub async fn close(&self, deadline: Duration) -> Result<()> {
        let files = self.files.close(deadline).await;
        if let Err(e) = &files {
            error!(subsystem = "db", op = "close", "Error closing MongoDB: {}", e);
        } else {
            info!(subsystem = "db", op = "close", "MongoDB connection closed");
        }
        self.elastic.close();
        info!(subsystem = "db", op = "close", "Elasticsearch client closed");
        files
    }
}
