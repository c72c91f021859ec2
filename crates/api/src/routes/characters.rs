use axum::routing::{get, post};
use axum::Router;

use crate::handlers::characters;
use crate::state::AppState;

/// Routes mounted at `/characters`.
///
/// ```text
/// GET    /                  -> list
/// POST   /reload            -> reload
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(characters::list))
        .route("/reload", post(characters::reload))
}
