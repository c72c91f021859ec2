#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use roster_store::{MemoryTable, SheetRecordStore};
use tower::ServiceExt;

use roster_api::config::{ServerConfig, StoreBackend};
use roster_api::router::build_app_router;
use roster_api::state::AppState;

pub type TestStore = SheetRecordStore<MemoryTable>;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        store: StoreBackend::Memory,
    }
}

/// An in-memory store pre-filled with `rows`.
pub fn memory_store(rows: Vec<Vec<String>>) -> Arc<TestStore> {
    Arc::new(SheetRecordStore::new(MemoryTable::with_rows(rows)))
}

/// Build the full application router over `store` and load the cache, as
/// `main.rs` does at startup.
///
/// The router is cheap to clone and every clone shares one session, so a
/// test can issue a sequence of requests against the same state.
pub async fn build_test_app(store: Arc<TestStore>) -> Router {
    let config = test_config();
    let state = AppState::new(store, config.clone());
    state.reload_session().await;
    build_app_router(state, &config)
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A stored row with a valid blob for `name`.
pub fn stored_row(id: &str, name: &str, age: &str) -> Vec<String> {
    let blob = serde_json::json!({
        "profile": { "name": name, "age_info": age },
        "timeline": [{ "date": "2010年4月", "event": "入学", "note": "" }],
    });
    vec![
        id.to_string(),
        name.to_string(),
        String::new(),
        "2024-01-01 00:00:00".to_string(),
        blob.to_string(),
    ]
}
