//! Handlers for the `/session` resource: the single editing session.
//!
//! Every mutating handler returns the resulting [`SessionView`], so the UI
//! can re-render from one response.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use roster_core::form::{FormPatch, FormValues};
use roster_core::record::CharacterSummary;
use roster_core::session::{Mode, SessionContext};
use roster_core::store::UpsertOutcome;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Snapshot of the session as the UI sees it.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub mode: Mode,
    /// `None` while listing.
    pub form: Option<FormValues>,
    pub last_error: Option<String>,
}

impl SessionView {
    fn of(session: &SessionContext) -> Self {
        let form = match session.mode() {
            Mode::Listing => None,
            Mode::Creating { .. } | Mode::Editing { .. } => Some(session.form().clone()),
        };
        Self {
            mode: session.mode().clone(),
            form,
            last_error: session.last_error().map(str::to_string),
        }
    }
}

/// Body of a successful save.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub id: String,
    pub outcome: UpsertOutcome,
    /// The reloaded listing.
    pub characters: Vec<CharacterSummary>,
}

type ViewResponse = Json<DataResponse<SessionView>>;

fn view(session: &SessionContext) -> ViewResponse {
    Json(DataResponse {
        data: SessionView::of(session),
    })
}

/// GET /api/v1/session
pub async fn current(State(state): State<AppState>) -> AppResult<ViewResponse> {
    let session = state.session.lock().await;
    Ok(view(&session))
}

/// POST /api/v1/session/new
///
/// Opens a blank form under a fresh identifier. Any open form is dropped.
pub async fn begin_create(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, ViewResponse)> {
    let mut session = state.session.lock().await;
    let id = session.begin_create();
    tracing::debug!(id = %id, "Opened new character form");
    Ok((StatusCode::CREATED, view(&session)))
}

/// POST /api/v1/session/edit/{id}
pub async fn begin_edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ViewResponse> {
    let mut session = state.session.lock().await;
    session.begin_edit(&id)?;
    Ok(view(&session))
}

/// PUT /api/v1/session/fields
///
/// Applies a partial update. Rejected as a whole if any field path is
/// unknown.
pub async fn update_fields(
    State(state): State<AppState>,
    Json(patch): Json<FormPatch>,
) -> AppResult<ViewResponse> {
    let mut session = state.session.lock().await;
    session.apply_patch(patch)?;
    Ok(view(&session))
}

/// POST /api/v1/session/timeline
pub async fn add_timeline_row(State(state): State<AppState>) -> AppResult<ViewResponse> {
    let mut session = state.session.lock().await;
    session.add_timeline_row()?;
    Ok(view(&session))
}

/// DELETE /api/v1/session/timeline/{index}
pub async fn remove_timeline_row(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> AppResult<ViewResponse> {
    let mut session = state.session.lock().await;
    session.remove_timeline_row(index)?;
    Ok(view(&session))
}

/// POST /api/v1/session/licenses
pub async fn add_license_row(State(state): State<AppState>) -> AppResult<ViewResponse> {
    let mut session = state.session.lock().await;
    session.add_license_row()?;
    Ok(view(&session))
}

/// DELETE /api/v1/session/licenses/{index}
pub async fn remove_license_row(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> AppResult<ViewResponse> {
    let mut session = state.session.lock().await;
    session.remove_license_row(index)?;
    Ok(view(&session))
}

/// POST /api/v1/session/cancel
pub async fn cancel(State(state): State<AppState>) -> AppResult<ViewResponse> {
    let mut session = state.session.lock().await;
    session.cancel();
    Ok(view(&session))
}

/// POST /api/v1/session/save
///
/// Applies the body as a final patch (send `{}` for none), then writes the
/// open form. On a write failure the form stays open and the response is
/// 502 `WRITE_FAILED`.
pub async fn save(
    State(state): State<AppState>,
    Json(patch): Json<FormPatch>,
) -> AppResult<Json<DataResponse<SaveResponse>>> {
    let mut session = state.session.lock().await;
    session.apply_patch(patch)?;
    let report = session.save(state.store.as_ref()).await?;
    state.publish_count(&session);
    Ok(Json(DataResponse {
        data: SaveResponse {
            id: report.id,
            outcome: report.outcome,
            characters: session.listing(),
        },
    }))
}
