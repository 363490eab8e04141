//! Thin Elasticsearch REST client.
//!
//! Only the handful of endpoints the repositories need are wrapped. Every call
//! returns the HTTP status together with the decoded JSON body so callers can
//! classify engine errors (`index_not_found_exception` and friends) themselves.

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use deepcytes_core::{Error, Result, ServiceProbe, UpdateOutcome};

use crate::config::ElasticConfig;
use crate::indices::provision_indices;

/// Engine error type for a missing index.
pub const INDEX_NOT_FOUND: &str = "index_not_found_exception";
/// Engine error type for creating an index that already exists.
pub const RESOURCE_ALREADY_EXISTS: &str = "resource_already_exists_exception";
/// Engine error type for a partial update of a missing document.
pub const DOCUMENT_MISSING: &str = "document_missing_exception";

/// `error.type` of an engine error body, if any.
pub fn error_type(body: &Value) -> Option<&str> {
    body.get("error")?.get("type")?.as_str()
}

fn error_reason(body: &Value) -> String {
    body.get("error")
        .and_then(|e| e.get("reason"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

fn engine_error(op: &str, status: StatusCode, body: &Value) -> Error {
    let kind = error_type(body).unwrap_or("unknown");
    Error::Search(format!(
        "{} failed with {}: {}: {}",
        op,
        status.as_u16(),
        kind,
        error_reason(body)
    ))
}

/// A document id encoded as a single URL path segment.
///
/// `None` for ids that would be resolved as dot segments even when
/// escaped; no stored document can carry one.
fn id_segment(id: &str) -> Option<Cow<'_, str>> {
    match id {
        "" | "." | ".." => None,
        _ => Some(urlencoding::encode(id)),
    }
}

/// One search or get hit.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Value,
}

impl Hit {
    /// Decode `_source` into a typed record.
    pub fn source_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.source.clone())?)
    }
}

/// Decoded `hits` section of a search response.
#[derive(Debug, Clone, Default)]
pub struct SearchHits {
    pub total: u64,
    pub max_score: Option<f64>,
    pub hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: RawHits,
}

#[derive(Deserialize)]
struct RawHits {
    #[serde(default)]
    total: Option<TotalHits>,
    #[serde(default)]
    max_score: Option<f64>,
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct TotalHits {
    value: u64,
}

/// Cluster health summary.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterHealth {
    pub cluster_name: String,
    pub status: String,
    #[serde(default)]
    pub number_of_nodes: u64,
}

/// Result of an index creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCreation {
    Created,
    AlreadyExists,
}

/// Elasticsearch client over the REST API.
pub struct ElasticClient {
    http: Client,
    base_url: String,
    username: String,
    password: Option<String>,
    closed: AtomicBool,
    indices: OnceCell<()>,
}

impl ElasticClient {
    /// Build a client from configuration. No request is sent.
    pub fn new(config: &ElasticConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.tls_insecure)
            .build()
            .map_err(|e| Error::Config(format!("search engine client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.node.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            closed: AtomicBool::new(false),
            indices: OnceCell::new(),
        })
    }

    /// Create any missing index once per client.
    ///
    /// Every document and search call awaits this first, so an index is never
    /// created implicitly by a write with dynamic mapping. A failed attempt is
    /// retried on the next call.
    pub async fn ensure_indices(&self) -> Result<()> {
        self.indices
            .get_or_try_init(|| async move {
                let created = provision_indices(self).await?;
                info!(
                    subsystem = "db",
                    component = "elastic",
                    op = "ensure_indices",
                    created = created.len(),
                    "Indices ready"
                );
                Ok::<(), Error>(())
            })
            .await
            .map(|_| ())
    }

    /// Node URL this client talks to.
    pub fn node(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let req = self.http.request(method, url);
        match &self.password {
            Some(password) => req.basic_auth(&self.username, Some(password)),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<(StatusCode, Value)> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Unavailable("search engine client is closed".into()));
        }
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok((status, body))
    }

    /// `GET /`; succeeds when the node answers.
    pub async fn ping(&self) -> Result<()> {
        let (status, body) = self.send(self.request(Method::GET, "/")).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(engine_error("ping", status, &body))
        }
    }

    /// `GET /_cluster/health`.
    pub async fn cluster_health(&self) -> Result<ClusterHealth> {
        let (status, body) = self
            .send(self.request(Method::GET, "_cluster/health"))
            .await?;
        if !status.is_success() {
            return Err(engine_error("cluster health", status, &body));
        }
        Ok(serde_json::from_value(body)?)
    }

    /// `HEAD /{index}`.
    pub async fn index_exists(&self, index: &str) -> Result<bool> {
        let (status, body) = self.send(self.request(Method::HEAD, index)).await?;
        match status {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(engine_error("index exists", s, &body)),
        }
    }

    /// `PUT /{index}` with settings and mappings.
    pub async fn create_index(&self, index: &str, definition: &Value) -> Result<IndexCreation> {
        let (status, body) = self
            .send(self.request(Method::PUT, index).json(definition))
            .await?;
        if status.is_success() {
            Ok(IndexCreation::Created)
        } else if error_type(&body) == Some(RESOURCE_ALREADY_EXISTS) {
            Ok(IndexCreation::AlreadyExists)
        } else {
            Err(engine_error("create index", status, &body))
        }
    }

    /// `POST /{index}/_doc`; returns the generated id.
    pub async fn index_document(&self, index: &str, document: &Value) -> Result<String> {
        self.ensure_indices().await?;
        let path = format!("{}/_doc", index);
        let (status, body) = self
            .send(self.request(Method::POST, &path).json(document))
            .await?;
        if !status.is_success() {
            return Err(engine_error("index document", status, &body));
        }
        body.get("_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Search("index response carried no _id".into()))
    }

    /// `POST /{index}/_update/{id}` with a partial document.
    ///
    /// A missing document or index maps to `Error::NotFound`.
    pub async fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Value,
    ) -> Result<UpdateOutcome> {
        self.ensure_indices().await?;
        let Some(segment) = id_segment(id) else {
            return Err(Error::NotFound(format!("document {:?} in {}", id, index)));
        };
        let path = format!("{}/_update/{}", index, segment);
        let (status, body) = self
            .send(self.request(Method::POST, &path).json(&json!({ "doc": partial })))
            .await?;
        if status == StatusCode::NOT_FOUND
            || matches!(error_type(&body), Some(DOCUMENT_MISSING) | Some(INDEX_NOT_FOUND))
        {
            return Err(Error::NotFound(format!("document {} in {}", id, index)));
        }
        if !status.is_success() {
            return Err(engine_error("update document", status, &body));
        }
        match body.get("result").and_then(Value::as_str) {
            Some("noop") => Ok(UpdateOutcome::Noop),
            _ => Ok(UpdateOutcome::Updated),
        }
    }

    /// `GET /{index}/_doc/{id}`; `None` when absent.
    pub async fn get_document(&self, index: &str, id: &str) -> Result<Option<Hit>> {
        self.ensure_indices().await?;
        let Some(segment) = id_segment(id) else {
            return Ok(None);
        };
        let path = format!("{}/_doc/{}", index, segment);
        let (status, body) = self.send(self.request(Method::GET, &path)).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(engine_error("get document", status, &body));
        }
        if body.get("found").and_then(Value::as_bool) == Some(false) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(body)?))
    }

    /// `DELETE /{index}/_doc/{id}`; `false` when nothing was deleted.
    pub async fn delete_document(&self, index: &str, id: &str) -> Result<bool> {
        self.ensure_indices().await?;
        let Some(segment) = id_segment(id) else {
            return Ok(false);
        };
        let path = format!("{}/_doc/{}", index, segment);
        let (status, body) = self.send(self.request(Method::DELETE, &path)).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(engine_error("delete document", status, &body));
        }
        Ok(body.get("result").and_then(Value::as_str) == Some("deleted"))
    }

    /// `POST /{index}/_delete_by_query?refresh=true`; returns the deleted count.
    pub async fn delete_by_query(&self, index: &str, query: &Value) -> Result<u64> {
        self.ensure_indices().await?;
        let path = format!("{}/_delete_by_query?refresh=true", index);
        let (status, body) = self
            .send(self.request(Method::POST, &path).json(&json!({ "query": query })))
            .await?;
        if error_type(&body) == Some(INDEX_NOT_FOUND) {
            return Ok(0);
        }
        if !status.is_success() {
            return Err(engine_error("delete by query", status, &body));
        }
        Ok(body.get("deleted").and_then(Value::as_u64).unwrap_or(0))
    }

    /// `POST /{index}/_search`. A missing index yields no hits.
    pub async fn search(&self, index: &str, request: &Value) -> Result<SearchHits> {
        self.ensure_indices().await?;
        let path = format!("{}/_search", index);
        let (status, body) = self
            .send(self.request(Method::POST, &path).json(request))
            .await?;
        if error_type(&body) == Some(INDEX_NOT_FOUND) {
            debug!(index, "search on missing index");
            return Ok(SearchHits::default());
        }
        if !status.is_success() {
            return Err(engine_error("search", status, &body));
        }
        parse_search_response(body)
    }

    /// `POST /{index}/_refresh` so that the next search sees prior writes.
    pub async fn refresh(&self, index: &str) -> Result<()> {
        let path = format!("{}/_refresh", index);
        let (status, body) = self.send(self.request(Method::POST, &path)).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(engine_error("refresh", status, &body))
        }
    }

    /// Stop accepting calls. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

fn parse_search_response(body: Value) -> Result<SearchHits> {
    let response: SearchResponse = serde_json::from_value(body)?;
    let hits = response.hits;
    Ok(SearchHits {
        total: hits
            .total
            .map(|t| t.value)
            .unwrap_or(hits.hits.len() as u64),
        max_score: hits.max_score,
        hits: hits.hits,
    })
}

#[async_trait]
impl ServiceProbe for ElasticClient {
    fn service_name(&self) -> &'static str {
        "elasticsearch"
    }

    #[instrument(skip(self), fields(subsystem = "db", component = "elastic", op = "probe"))]
    async fn probe(&self) -> bool {
        match self.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Elasticsearch health check failed: {}", e);
                false
            }
        }
    }
}
