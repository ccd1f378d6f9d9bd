use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::Local;
use serde_json::{json, Value};

use crate::{error::ApiError, render, AppState};

/// GET / — the board, newest first.
pub async fn index(
    State(state): State<AppState>,
) -> Result<Html<String>, (StatusCode, String)> {
    let items = state.announcements.list_all().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to load announcements: {e}"),
        )
    })?;
    Ok(Html(render::index_page(&items, &Local::now())))
}

/// POST /add — JSON clients get the stored item back, form posts are sent
/// back to the board.
pub async fn add_announcement(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ApiError> {
    let json_client = is_json(request.headers());
    let fields = if json_client {
        json_fields(request, &state).await?
    } else {
        form_fields(request, &state).await?
    };

    let item = state
        .announcements
        .create(
            fields.get("title").map(String::as_str),
            fields.get("text").map(String::as_str),
        )
        .await?;

    if json_client {
        Ok((StatusCode::CREATED, Json(json!({ "ok": true, "item": item }))).into_response())
    } else {
        Ok(Redirect::to("/").into_response())
    }
}

/// `application/json` or any `application/*+json` media type.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<mime::Mime>().ok())
        .is_some_and(|m| {
            m.type_() == mime::APPLICATION
                && (m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
        })
}

/// String members of a JSON object body. An unparsable body, or a member
/// that is not a string, reads as absent; an oversize body is refused.
async fn json_fields(
    request: Request,
    state: &AppState,
) -> Result<HashMap<String, String>, ApiError> {
    match Json::<Value>::from_request(request, state).await {
        Ok(Json(Value::Object(map))) => Ok(map
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect()),
        Ok(_) => Ok(HashMap::new()),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(ApiError::PayloadTooLarge(rejection.body_text()))
        }
        Err(rejection) => {
            tracing::debug!("Ignoring unreadable JSON body: {rejection}");
            Ok(HashMap::new())
        }
    }
}

async fn form_fields(
    request: Request,
    state: &AppState,
) -> Result<HashMap<String, String>, ApiError> {
    match Form::<HashMap<String, String>>::from_request(request, state).await {
        Ok(Form(fields)) => Ok(fields),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(ApiError::PayloadTooLarge(rejection.body_text()))
        }
        Err(rejection) => {
            tracing::debug!("Ignoring unreadable form body: {rejection}");
            Ok(HashMap::new())
        }
    }
}
