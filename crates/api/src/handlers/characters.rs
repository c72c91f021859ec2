//! Handlers for the `/characters` listing.
//!
//! The listing is served from the session's cache. It only changes when the
//! cache is reloaded, either explicitly or after a successful save.

use axum::extract::State;
use axum::Json;
use roster_core::record::CharacterSummary;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/characters
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<CharacterSummary>>>> {
    let session = state.session.lock().await;
    Ok(Json(DataResponse {
        data: session.listing(),
    }))
}

/// POST /api/v1/characters/reload
///
/// Replaces the cache with the store's current rows. An unreachable store
/// yields an empty list, not an error.
pub async fn reload(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<CharacterSummary>>>> {
    let mut session = state.session.lock().await;
    session.reload(state.store.as_ref()).await;
    state.publish_count(&session);
    Ok(Json(DataResponse {
        data: session.listing(),
    }))
}
