//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, build_test_app, get, memory_store, post_empty, post_json, stored_row, test_config};
use roster_api::router::build_app_router;
use roster_api::state::AppState;
use roster_core::record::{CharacterRecord, Sections};
use roster_core::store::{RecordStore, UpsertOutcome, WriteFailure};
use serde_json::json;
use tokio::sync::Notify;
use tower::ServiceExt;

/// A store whose writes never finish.
struct StalledStore {
    write_started: Arc<Notify>,
}

#[async_trait]
impl RecordStore for StalledStore {
    async fn load_all(&self) -> Vec<CharacterRecord> {
        Vec::new()
    }

    async fn upsert(&self, _id: &str, _sections: &Sections) -> Result<UpsertOutcome, WriteFailure> {
        self.write_started.notify_one();
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(UpsertOutcome::Inserted)
    }
}

// ---------------------------------------------------------------------------
// Test: GET /health returns 200 with expected JSON fields
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let app = build_test_app(memory_store(vec![stored_row("c1", "Aki", "17")])).await;
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["cached_characters"], 1);
}

// ---------------------------------------------------------------------------
// Test: health stays ok when the store is unreachable
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_ok_with_unreachable_store() {
    let store = memory_store(vec![]);
    store.table().set_offline(true);
    let app = build_test_app(store).await;

    let response = get(app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["cached_characters"], 0);
}

// ---------------------------------------------------------------------------
// Test: health answers while a save is stuck on the store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_answers_while_a_save_is_in_flight() {
    let write_started = Arc::new(Notify::new());
    let store = Arc::new(StalledStore {
        write_started: Arc::clone(&write_started),
    });
    let config = test_config();
    let app = build_app_router(AppState::new(store, config.clone()), &config);

    let opened = post_empty(app.clone(), "/api/v1/session/new").await;
    assert_eq!(opened.status(), StatusCode::CREATED);

    let saving = tokio::spawn(post_json(app.clone(), "/api/v1/session/save", json!({})));
    write_started.notified().await;

    let response = tokio::time::timeout(Duration::from_secs(2), get(app, "/health"))
        .await
        .expect("/health blocked behind the in-flight save");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["cached_characters"], 0);

    saving.abort();
}

// ---------------------------------------------------------------------------
// Test: health count follows saves and reloads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_count_tracks_saves() {
    let store = memory_store(vec![]);
    let app = build_test_app(store.clone()).await;

    post_empty(app.clone(), "/api/v1/session/new").await;
    let saved = post_json(
        app.clone(),
        "/api/v1/session/save",
        json!({ "fields": { "profile.name": "Aki" } }),
    )
    .await;
    assert_eq!(saved.status(), StatusCode::OK);
    assert_eq!(body_json(get(app.clone(), "/health").await).await["cached_characters"], 1);

    store.table().set_offline(true);
    post_empty(app.clone(), "/api/v1/characters/reload").await;
    assert_eq!(body_json(get(app, "/health").await).await["cached_characters"], 0);
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_test_app(memory_store(vec![])).await;
    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = build_test_app(memory_store(vec![])).await;
    let response = get(app, "/health").await;

    let request_id = response.headers().get("x-request-id");
    assert!(
        request_id.is_some(),
        "Response must contain an x-request-id header"
    );
    let id_str = request_id.unwrap().to_str().unwrap();
    assert_eq!(id_str.len(), 36, "x-request-id should be a UUID string");
}

// ---------------------------------------------------------------------------
// Test: CORS preflight OPTIONS request returns correct headers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cors_preflight_returns_correct_headers() {
    let app = build_test_app(memory_store(vec![])).await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/session/save")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let allow_origin = response
        .headers()
        .get("access-control-allow-origin")
        .expect("Missing Access-Control-Allow-Origin header")
        .to_str()
        .unwrap();
    assert_eq!(allow_origin, "http://localhost:5173");
}
