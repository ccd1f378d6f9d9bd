use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{error::ApiError, AppState};

/// GET /healthcheck — storage connectivity only, no business reads.
pub async fn healthcheck(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .announcements
        .health()
        .await
        .map_err(ApiError::Unavailable)?;
    Ok(Json(json!({ "ok": true })))
}
