//! Handlers for the form layout and starting values.

use axum::extract::{Query, State};
use axum::Json;
use roster_core::form::{self, FormSchema, FormValues};
use roster_core::session::FormMode;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/form/schema
pub async fn schema() -> AppResult<Json<DataResponse<FormSchema>>> {
    Ok(Json(DataResponse {
        data: form::form_schema(),
    }))
}

/// Query parameters for [`defaults`].
#[derive(Debug, Deserialize)]
pub struct DefaultsQuery {
    /// `creating` or `editing`.
    pub mode: String,
    /// Required when `mode=editing`.
    pub id: Option<String>,
}

impl DefaultsQuery {
    fn form_mode(self) -> Result<FormMode, AppError> {
        match (self.mode.as_str(), self.id) {
            ("creating", _) => Ok(FormMode::Creating),
            ("editing", Some(id)) if !id.trim().is_empty() => Ok(FormMode::Editing(id)),
            ("editing", _) => Err(AppError::BadRequest(
                "mode=editing requires an id".to_string(),
            )),
            (other, _) => Err(AppError::BadRequest(format!(
                "Unknown form mode '{other}'"
            ))),
        }
    }
}

/// GET /api/v1/form/defaults?mode=creating|editing&id=
///
/// Starting values for a form in the given mode. Does not change the
/// session.
pub async fn defaults(
    State(state): State<AppState>,
    Query(query): Query<DefaultsQuery>,
) -> AppResult<Json<DataResponse<FormValues>>> {
    let mode = query.form_mode()?;
    let session = state.session.lock().await;
    let values = session.field_defaults(&mode)?;
    Ok(Json(DataResponse { data: values }))
}
