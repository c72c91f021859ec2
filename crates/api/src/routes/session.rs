use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::session;
use crate::state::AppState;

/// Routes mounted at `/session`.
///
/// ```text
/// GET    /                       -> current
/// POST   /new                    -> begin_create
/// POST   /edit/{id}              -> begin_edit
/// PUT    /fields                 -> update_fields
/// POST   /timeline               -> add_timeline_row
/// DELETE /timeline/{index}       -> remove_timeline_row
/// POST   /licenses               -> add_license_row
/// DELETE /licenses/{index}       -> remove_license_row
/// POST   /cancel                 -> cancel
/// POST   /save                   -> save
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(session::current))
        .route("/new", post(session::begin_create))
        .route("/edit/{id}", post(session::begin_edit))
        .route("/fields", put(session::update_fields))
        .route("/timeline", post(session::add_timeline_row))
        .route("/timeline/{index}", delete(session::remove_timeline_row))
        .route("/licenses", post(session::add_license_row))
        .route("/licenses/{index}", delete(session::remove_license_row))
        .route("/cancel", post(session::cancel))
        .route("/save", post(session::save))
}
