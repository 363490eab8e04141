//! Index provisioning on first use.

mod common;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use deepcytes_db::{
    AuthUserRepository, Database, EsAuthUserRepository, EsSearchHistoryRepository,
    SearchHistoryRepository,
};

use common::{client_for, engine_error, request_lines, search_hits};

async fn mount_missing_indices(server: &MockServer) {
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
    for index in ["/search_history", "/users"] {
        Mock::given(method("PUT"))
            .and(path(index))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
            .expect(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_first_lookup_creates_indices_with_mappings() {
    let server = MockServer::start().await;
    mount_missing_indices(&server).await;
    Mock::given(method("PUT"))
        .and(path("/auth_users"))
        .and(body_partial_json(json!({
            "mappings": { "properties": { "email": { "type": "keyword" } } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth_users/_search"))
        .respond_with(search_hits(vec![]))
        .expect(2)
        .mount(&server)
        .await;

    let repo = EsAuthUserRepository::new(client_for(&server));
    assert!(repo.find_by_email("ann@example.com").await.unwrap().is_none());
    assert!(repo.find_by_email("ann@example.com").await.unwrap().is_none());

    // Indices are created before the first search and only once.
    let lines = request_lines(&server).await;
    let first_search = lines
        .iter()
        .position(|(m, p)| m == "POST" && p == "/auth_users/_search")
        .unwrap();
    let puts: Vec<_> = lines
        .iter()
        .enumerate()
        .filter(|(_, (m, _))| m == "PUT")
        .map(|(i, _)| i)
        .collect();
    assert_eq!(puts.len(), 3);
    assert!(puts.iter().all(|&i| i < first_search));
}

#[tokio::test]
async fn test_concurrent_creation_is_tolerated() {
    let server = MockServer::start().await;
    mount_missing_indices(&server).await;
    Mock::given(method("PUT"))
        .and(path("/auth_users"))
        .respond_with(engine_error("resource_already_exists_exception", 400))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth_users/_search"))
        .respond_with(search_hits(vec![]))
        .mount(&server)
        .await;

    let repo = EsAuthUserRepository::new(client_for(&server));
    assert!(repo.find_by_email("ann@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_provisioning_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search_history/_search"))
        .respond_with(search_hits(vec![]))
        .expect(1)
        .mount(&server)
        .await;

    let repo = EsSearchHistoryRepository::new(client_for(&server));
    assert!(repo.list_for_user("user-1", 50).await.is_err());
    assert!(repo.list_for_user("user-1", 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_startup_provision_covers_later_calls() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth_users/_search"))
        .respond_with(search_hits(vec![]))
        .mount(&server)
        .await;

    let db = Database::connect(
        &deepcytes_db::ElasticConfig::new().node(server.uri()),
        &deepcytes_db::MongoConfig::default(),
    )
    .await
    .unwrap();
    db.provision().await.unwrap();
    assert!(db.auth_users.find_by_email("a@b.co").await.unwrap().is_none());
}
