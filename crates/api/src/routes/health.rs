use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Number of characters currently cached by the session.
    pub cached_characters: usize,
}

/// GET /health -- liveness. Takes neither the store nor the session lock,
/// so a slow spreadsheet does not make the service look down.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cached_characters = state.cached_count();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cached_characters,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
