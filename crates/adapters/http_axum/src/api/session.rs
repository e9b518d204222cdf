//! JSON handlers for the session table.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use vehiclehub_app::ports::{SettingsPersistence, StateMirror};
use vehiclehub_app::stores::SetOptions;
use vehiclehub_domain::error::NotFoundError;
use vehiclehub_domain::key::Key;
use vehiclehub_domain::value::Value;

use super::ListQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for writing a session value.
#[derive(Deserialize)]
pub struct SetRequest {
    pub value: serde_json::Value,
}

/// `GET /session` — every entry, or key→value with `?min=1`.
pub async fn list<M, P>(
    State(state): State<AppState<M, P>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    if query.is_min() {
        Json(state.session.get_all_min()).into_response()
    } else {
        Json(state.session.get_all()).into_response()
    }
}

/// `GET /session/{name}`
pub async fn get<M, P>(
    State(state): State<AppState<M, P>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    let key = Key::parse(&name)?;
    let entry = state
        .session
        .get_entry(key.as_str())
        .ok_or_else(|| NotFoundError {
            entity: "Session key",
            id: key.to_string(),
        })?;
    Ok(Json(entry).into_response())
}

/// `POST /session/{name}` with `{"value": ...}` returns the stored entry.
///
/// A body that is not `{"value": ...}` JSON is a 400 with the usual
/// outcome body.
pub async fn set<M, P>(
    State(state): State<AppState<M, P>>,
    Path(name): Path<String>,
    body: Result<Json<SetRequest>, JsonRejection>,
) -> Result<Response, ApiError>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    let Json(body) = body?;
    let value = Value::from_json(&name, body.value)?;
    let key = state.session.set(&name, value, SetOptions::default())?;
    let entry = state
        .session
        .get_entry(key.as_str())
        .ok_or_else(|| NotFoundError {
            entity: "Session key",
            id: key.to_string(),
        })?;
    Ok(Json(entry).into_response())
}
