//! Shared handler state.

use std::sync::Arc;
use std::time::Instant;

use deepcytes_core::{
    AuthUserRepository, FileMetadataRepository, SearchHistoryRepository, ServiceProbe,
    UploadPolicy, UserDirectoryRepository,
};
use deepcytes_db::{Database, InMemoryStore};

use crate::config::ServerConfig;

/// Repositories, probes, and configuration injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth_users: Arc<dyn AuthUserRepository>,
    pub users: Arc<dyn UserDirectoryRepository>,
    pub search_history: Arc<dyn SearchHistoryRepository>,
    pub files: Arc<dyn FileMetadataRepository>,
    pub elasticsearch: Arc<dyn ServiceProbe>,
    pub mongodb: Arc<dyn ServiceProbe>,
    pub config: Arc<ServerConfig>,
    pub started_at: Instant,
}

impl AppState {
    /// State backed by the real stores.
    pub fn from_database(db: &Database, config: ServerConfig) -> Self {
        Self {
            auth_users: db.auth_users.clone(),
            users: db.users.clone(),
            search_history: db.search_history.clone(),
            files: db.files.clone(),
            elasticsearch: db.elastic.clone(),
            mongodb: db.files.clone(),
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// State backed by an in-memory store.
    pub fn in_memory(store: &InMemoryStore, config: ServerConfig) -> Self {
        let shared = Arc::new(store.clone());
        Self {
            auth_users: shared.clone(),
            users: shared.clone(),
            search_history: shared.clone(),
            files: shared,
            elasticsearch: Arc::new(store.search_probe()),
            mongodb: Arc::new(store.files_probe()),
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Upload limits derived from configuration.
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(self.config.max_file_size)
    }
}
