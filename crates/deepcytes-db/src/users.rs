//! Directory records in the `users` index.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use deepcytes_core::defaults::USERS_INDEX;
use deepcytes_core::{
    DirectoryPage, DirectorySearchResult, DirectoryUser, DirectoryUserHit, Result,
    UpdateOutcome, UserDirectoryRepository,
};

use crate::elastic::{ElasticClient, Hit};

#[derive(Debug, Serialize, Deserialize)]
struct DirectorySource {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

fn to_directory_user(hit: &Hit) -> Result<DirectoryUser> {
    let source: DirectorySource = hit.source_as()?;
    Ok(DirectoryUser {
        id: hit.id.clone(),
        email: source.email,
        password: source.password,
    })
}

/// Elasticsearch-backed user directory.
pub struct EsUserDirectoryRepository {
    client: Arc<ElasticClient>,
}

impl EsUserDirectoryRepository {
    pub fn new(client: Arc<ElasticClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserDirectoryRepository for EsUserDirectoryRepository {
    #[instrument(skip(self, email, password), fields(subsystem = "db", component = "users", op = "create"))]
    async fn create(&self, email: &str, password: &str) -> Result<String> {
        let id = self
            .client
            .index_document(USERS_INDEX, &json!({ "email": email, "password": password }))
            .await?;
        self.client.refresh(USERS_INDEX).await?;
        Ok(id)
    }

    #[instrument(skip(self), fields(subsystem = "db", component = "users", op = "list"))]
    async fn list(&self, from: u64, size: u64) -> Result<DirectoryPage> {
        let request = json!({
            "query": { "match_all": {} },
            "from": from,
            "size": size,
            "track_total_hits": true
        });
        let hits = self.client.search(USERS_INDEX, &request).await?;
        let users = hits
            .hits
            .iter()
            .map(to_directory_user)
            .collect::<Result<Vec<_>>>()?;
        Ok(DirectoryPage {
            users,
            total: hits.total,
        })
    }

    #[instrument(skip(self), fields(subsystem = "db", component = "users", op = "search_by_email"))]
    async fn search_by_email(&self, query: &str, size: u64) -> Result<DirectorySearchResult> {
        let request = json!({
            "query": { "match": { "email": query } },
            "size": size
        });
        let hits = self.client.search(USERS_INDEX, &request).await?;
        let users = hits
            .hits
            .iter()
            .map(|hit| {
                Ok(DirectoryUserHit {
                    user: to_directory_user(hit)?,
                    score: hit.score,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DirectorySearchResult {
            users,
            total: hits.total,
            max_score: hits.max_score,
        })
    }

    #[instrument(skip(self, email, password), fields(subsystem = "db", component = "users", op = "replace"))]
    async fn replace(&self, id: &str, email: &str, password: &str) -> Result<UpdateOutcome> {
        let outcome = self
            .client
            .update_document(
                USERS_INDEX,
                id,
                &json!({ "email": email, "password": password }),
            )
            .await?;
        if outcome == UpdateOutcome::Updated {
            self.client.refresh(USERS_INDEX).await?;
        }
        Ok(outcome)
    }

    #[instrument(skip(self), fields(subsystem = "db", component = "users", op = "delete"))]
    async fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.client.delete_document(USERS_INDEX, id).await?;
        if deleted {
            self.client.refresh(USERS_INDEX).await?;
        }
        Ok(deleted)
    }
}
