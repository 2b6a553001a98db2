//! End-to-end API integration tests
//!
//! These tests drive the router over the in-memory store:
//! - Onboarding through POST /api/users/full
//! - Version-checked updates and their 409 responses
//! - Idempotent disable/enable
//! - Error mapping for missing rows and invalid input

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use storefront_backoffice::api::{router, AppState};
use storefront_backoffice::auth::password::BcryptHasher;
use storefront_backoffice::infrastructure::repositories::InMemoryStore;
use tower::util::ServiceExt; // for oneshot

/// Setup test application over a fresh store
fn setup_app(store: &InMemoryStore) -> Router {
    router(AppState::new(
        store.repositories(),
        Arc::new(BcryptHasher::new(4)),
    ))
}

fn onboarding_payload(username: &str) -> Value {
    json!({
        "user": {
            "username": username,
            "email": format!("{}@x.com", username),
            "password": "Secret123"
        },
        "address": {
            "street": "Rua A",
            "number": "10",
            "city": "São Paulo",
            "state": "SP",
            "country": "Brasil",
            "postal_code": "01000000"
        },
        "contact": {
            "contact_name": "Ana",
            "cellphone": "11999990000"
        },
        "categories": [{ "id": 1 }, { "id": 2 }]
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn onboard(app: &Router, username: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/users/full",
        Some(onboarding_payload(username)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

#[tokio::test]
async fn test_health_check() {
    let store = InMemoryStore::new();
    let app = setup_app(&store);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_create_full_returns_created_aggregate() {
    let store = InMemoryStore::with_categories([1, 2]);
    let app = setup_app(&store);

    let body = onboard(&app, "ana").await;

    let user_id = body["user"]["id"].as_i64().unwrap();
    assert!(user_id > 0);
    assert_eq!(body["user"]["version"], 0);
    assert_eq!(body["user"]["status"], "enabled");
    assert!(body["user"].get("password").is_none());
    assert_eq!(body["address"]["owner"], json!({ "kind": "user", "id": user_id }));
    assert_eq!(body["contact"]["owner"], json!({ "kind": "user", "id": user_id }));
    assert_eq!(body["categories"].as_array().unwrap().len(), 2);

    assert_eq!(store.user_count(), 1);
    assert_eq!(store.category_relation_count(), 2);
}

#[tokio::test]
async fn test_create_full_without_contact_is_bad_request() {
    let store = InMemoryStore::with_categories([1, 2]);
    let app = setup_app(&store);

    let mut payload = onboarding_payload("ana");
    payload.as_object_mut().unwrap().remove("contact");

    let (status, body) = send(&app, "POST", "/api/users/full", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "contact is required");
    assert_eq!(store.transactions_begun(), 0);
}

#[tokio::test]
async fn test_create_full_with_unknown_category_persists_nothing() {
    let store = InMemoryStore::with_categories([1]);
    let app = setup_app(&store);

    let (status, body) = send(
        &app,
        "POST",
        "/api/users/full",
        Some(onboarding_payload("ana")),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("category 2 does not exist"));
    assert_eq!(store.user_count(), 0);
    assert_eq!(store.address_count(), 0);
    assert_eq!(store.contact_count(), 0);
}

#[tokio::test]
async fn test_get_missing_user_is_not_found() {
    let store = InMemoryStore::new();
    let app = setup_app(&store);

    let (status, body) = send(&app, "GET", "/api/users/999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "user 999 not found");
}

#[tokio::test]
async fn test_zero_id_is_bad_request() {
    let store = InMemoryStore::new();
    let app = setup_app(&store);

    let (status, _) = send(&app, "PATCH", "/api/contacts/0/disable", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stale_user_update_is_conflict() {
    let store = InMemoryStore::with_categories([1, 2]);
    let app = setup_app(&store);
    let created = onboard(&app, "ana").await;
    let uri = format!("/api/users/{}", created["user"]["id"]);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({ "username": "ana_maria", "email": "ana@x.com", "version": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ana_maria");
    assert_eq!(body["version"], 1);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({ "username": "ana_clara", "email": "ana@x.com", "version": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("expected version 0"));

    let (_, current) = send(&app, "GET", &uri, None).await;
    assert_eq!(current["username"], "ana_maria");
}

#[tokio::test]
async fn test_disable_user_twice_is_idempotent() {
    let store = InMemoryStore::with_categories([1, 2]);
    let app = setup_app(&store);
    let created = onboard(&app, "ana").await;
    let uri = format!("/api/users/{}/disable", created["user"]["id"]);

    let (status, first) = send(&app, "PATCH", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "disabled");
    assert_eq!(first["changed"], true);
    assert_eq!(first["version"], 1);

    let (status, second) = send(&app, "PATCH", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["changed"], false);
    assert_eq!(second["version"], 1);
}

#[tokio::test]
async fn test_address_update_keeps_owner_and_bumps_version() {
    let store = InMemoryStore::with_categories([1, 2]);
    let app = setup_app(&store);
    let created = onboard(&app, "ana").await;
    let uri = format!("/api/addresses/{}", created["address"]["id"]);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({
            "street": "Avenida Paulista",
            "number": "1000",
            "city": "São Paulo",
            "state": "SP",
            "country": "Brasil",
            "postal_code": "01310100",
            "version": 0
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["street"], "Avenida Paulista");
    assert_eq!(body["version"], 1);
    assert_eq!(body["owner"], created["address"]["owner"]);
}

#[tokio::test]
async fn test_contact_toggle_and_missing_contact() {
    let store = InMemoryStore::with_categories([1, 2]);
    let app = setup_app(&store);
    let created = onboard(&app, "ana").await;
    let id = &created["contact"]["id"];

    let (status, enabled) = send(&app, "PATCH", &format!("/api/contacts/{}/enable", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(enabled["changed"], false);
    assert_eq!(enabled["version"], 0);

    let (status, _) = send(&app, "PATCH", "/api/contacts/4242/disable", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
