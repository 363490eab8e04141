//! User directory CRUD and search.

mod common;

use axum::http::StatusCode;
use axum::Router;
use serde_json::json;

use common::{empty_request, json_request, send, test_app};

async fn create(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        json_request("POST", "/users", json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create failed: {body}");
    assert_eq!(body["message"], "User created successfully");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_allows_duplicates_and_lowercases() {
    let (app, _) = test_app();
    let first = create(&app, "Zed@Example.com", "pw").await;
    let second = create(&app, "zed@example.com", "pw").await;
    assert_ne!(first, second);

    let (status, body) = send(&app, empty_request("GET", "/users")).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u["email"] == "zed@example.com"));
    assert_eq!(body["pagination"]["totalHits"], 2);
    assert_eq!(body["pagination"]["returnedHits"], 2);
    assert_eq!(body["pagination"]["currentPage"], 1);
}

#[tokio::test]
async fn test_create_validation() {
    let (app, _) = test_app();
    let (status, body) = send(&app, json_request("POST", "/users", json!({ "email": "a@b.co" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    let (status, body) = send(
        &app,
        json_request("POST", "/users", json!({ "email": "bad", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email format");
}

#[tokio::test]
async fn test_list_pagination_and_size_limit() {
    let (app, _) = test_app();
    for i in 0..12 {
        create(&app, &format!("user{i}@example.com"), "pw").await;
    }

    let (status, body) = send(&app, empty_request("GET", "/users?page=2&size=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 5);
    assert_eq!(body["users"][0]["email"], "user5@example.com");
    assert_eq!(body["pagination"]["currentPage"], 2);
    assert_eq!(body["pagination"]["totalHits"], 12);

    let (status, body) = send(&app, empty_request("GET", "/users?size=101")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid size");
    assert_eq!(body["details"], "Size cannot exceed 100 users per request");
}

#[tokio::test]
async fn test_search_by_email() {
    let (app, _) = test_app();
    create(&app, "ann@example.com", "pw").await;
    create(&app, "bob@other.org", "pw").await;

    let (status, body) = send(&app, empty_request("GET", "/users/search?q=%20example%20")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "example");
    assert_eq!(body["total"], 1);
    assert_eq!(body["users"][0]["email"], "ann@example.com");
    assert!(body["users"][0]["score"].as_f64().is_some());
    assert!(body["users"][0]["id"].as_str().is_some());
    assert!(body["maxScore"].as_f64().is_some());

    let (status, body) = send(&app, empty_request("GET", "/users/search")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing search query");

    let (status, body) = send(&app, empty_request("GET", "/users/search?q=ann&size=51")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Size cannot exceed 50 results per search");
}

#[tokio::test]
async fn test_replace_user() {
    let (app, _) = test_app();
    let id = create(&app, "kim@example.com", "pw1").await;

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/users/{id}"),
            json!({ "email": "KIM@example.com", "password": "pw1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No changes were made (data was identical)");

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/users/{id}"),
            json!({ "email": "kim@new.example.com", "password": "pw2" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User updated successfully");

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/users/missing-id",
            json!({ "email": "a@b.co", "password": "pw" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"], "No user found with the provided ID");
}

#[tokio::test]
async fn test_delete_user() {
    let (app, _) = test_app();
    let id = create(&app, "lee@example.com", "pw").await;

    let (status, body) = send(&app, empty_request("DELETE", &format!("/users/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, body) = send(&app, empty_request("DELETE", &format!("/users/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}
