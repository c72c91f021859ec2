pub mod characters;
pub mod form;
pub mod health;
pub mod session;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /characters                          cached listing (GET)
/// /characters/reload                   reload from the store (POST)
///
/// /form/schema                         tabs, labels, widgets (GET)
/// /form/defaults                       starting values for a mode (GET)
///
/// /session                             mode, open form, last error (GET)
/// /session/new                         open a blank form (POST)
/// /session/edit/{id}                   open an existing record (POST)
/// /session/fields                      patch the open form (PUT)
/// /session/timeline[/{index}]          add / remove timeline rows
/// /session/licenses[/{index}]          add / remove license rows
/// /session/cancel                      close without saving (POST)
/// /session/save                        persist and return to listing (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/characters", characters::router())
        .nest("/form", form::router())
        .nest("/session", session::router())
}
