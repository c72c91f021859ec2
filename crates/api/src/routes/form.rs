use axum::routing::get;
use axum::Router;

use crate::handlers::form;
use crate::state::AppState;

/// Routes mounted at `/form`.
///
/// ```text
/// GET    /schema            -> schema
/// GET    /defaults          -> defaults (?mode=creating|editing&id=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/schema", get(form::schema))
        .route("/defaults", get(form::defaults))
}
