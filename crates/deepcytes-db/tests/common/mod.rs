//! Shared fixtures for the search engine adapter tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use deepcytes_db::{ElasticClient, ElasticConfig};

/// Client pointed at `server`.
pub fn client_for(server: &MockServer) -> Arc<ElasticClient> {
    Arc::new(ElasticClient::new(&ElasticConfig::new().node(server.uri())).unwrap())
}

/// Mock node on which every index already exists.
pub async fn provisioned_node() -> (MockServer, Arc<ElasticClient>) {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let client = client_for(&server);
    (server, client)
}

/// `(METHOD, path)` of every request the node received, provisioning included.
pub async fn request_lines(server: &MockServer) -> Vec<(String, String)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| (r.method.to_string(), r.url.path().to_string()))
        .collect()
}

/// Engine error body.
pub fn engine_error(kind: &str, status: u16) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "error": { "type": kind, "reason": format!("{kind} raised") },
        "status": status
    }))
}

/// Search response carrying `hits`.
pub fn search_hits(hits: Vec<Value>) -> ResponseTemplate {
    let total = hits.len();
    ResponseTemplate::new(200).set_body_json(json!({
        "took": 1,
        "hits": {
            "total": { "value": total, "relation": "eq" },
            "max_score": if total > 0 { json!(1.0) } else { Value::Null },
            "hits": hits
        }
    }))
}

/// Acknowledgement for `_refresh`.
pub fn refreshed() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "_shards": { "total": 1, "successful": 1, "failed": 0 }
    }))
}
