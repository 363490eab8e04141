//! Per-user search history in the `search_history` index.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use deepcytes_core::defaults::SEARCH_HISTORY_INDEX;
use deepcytes_core::{
    Result, SaveOutcome, SaveSearchRequest, SearchHistoryEntry, SearchHistoryRepository,
};

use crate::elastic::{ElasticClient, Hit};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryWrite<'a> {
    user_id: &'a str,
    query: &'a str,
    timestamp: String,
    results_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistorySource {
    #[serde(default)]
    query: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    results_count: i64,
}

/// Millisecond RFC 3339, the precision of an engine `date` field.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_entry(hit: &Hit) -> Result<SearchHistoryEntry> {
    let source: HistorySource = hit.source_as()?;
    Ok(SearchHistoryEntry {
        id: hit.id.clone(),
        query: source.query,
        timestamp: source.timestamp,
        results_count: source.results_count,
    })
}

fn user_filter(user_id: &str) -> serde_json::Value {
    json!({ "term": { "userId": user_id } })
}

/// Elasticsearch-backed search history.
pub struct EsSearchHistoryRepository {
    client: Arc<ElasticClient>,
}

impl EsSearchHistoryRepository {
    pub fn new(client: Arc<ElasticClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchHistoryRepository for EsSearchHistoryRepository {
    #[instrument(skip(self, request), fields(subsystem = "db", component = "search_history", op = "save"))]
    async fn save(&self, request: SaveSearchRequest) -> Result<SaveOutcome> {
        let lookup = json!({
            "query": {
                "bool": {
                    "must": [
                        user_filter(&request.user_id),
                        { "match": { "query": request.query } }
                    ]
                }
            },
            "size": 1
        });
        let existing = self.client.search(SEARCH_HISTORY_INDEX, &lookup).await?;
        let timestamp = format_timestamp(&request.timestamp);

        let outcome = match existing.hits.first() {
            Some(hit) => {
                debug!(id = %hit.id, "Updating matching history entry");
                self.client
                    .update_document(
                        SEARCH_HISTORY_INDEX,
                        &hit.id,
                        &json!({ "timestamp": timestamp, "resultsCount": request.results_count }),
                    )
                    .await?;
                SaveOutcome::Updated(hit.id.clone())
            }
            None => {
                let doc = HistoryWrite {
                    user_id: &request.user_id,
                    query: &request.query,
                    timestamp,
                    results_count: request.results_count,
                };
                let id = self
                    .client
                    .index_document(SEARCH_HISTORY_INDEX, &serde_json::to_value(&doc)?)
                    .await?;
                SaveOutcome::Inserted(id)
            }
        };
        self.client.refresh(SEARCH_HISTORY_INDEX).await?;
        Ok(outcome)
    }

    #[instrument(skip(self), fields(subsystem = "db", component = "search_history", op = "list_for_user"))]
    async fn list_for_user(&self, user_id: &str, limit: u64) -> Result<Vec<SearchHistoryEntry>> {
        let request = json!({
            "query": user_filter(user_id),
            "sort": [ { "timestamp": { "order": "desc" } } ],
            "size": limit
        });
        let hits = self.client.search(SEARCH_HISTORY_INDEX, &request).await?;
        hits.hits.iter().map(to_entry).collect()
    }

    #[instrument(skip(self), fields(subsystem = "db", component = "search_history", op = "delete"))]
    async fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.client.delete_document(SEARCH_HISTORY_INDEX, id).await?;
        if deleted {
            self.client.refresh(SEARCH_HISTORY_INDEX).await?;
        }
        Ok(deleted)
    }

    #[instrument(skip(self), fields(subsystem = "db", component = "search_history", op = "delete_for_user"))]
    async fn delete_for_user(&self, user_id: &str) -> Result<u64> {
        self.client
            .delete_by_query(SEARCH_HISTORY_INDEX, &user_filter(user_id))
            .await
    }
}
