//! JSON handlers for the settings table.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};

use vehiclehub_app::ports::{SettingsPersistence, StateMirror};
use vehiclehub_domain::error::NotFoundError;
use vehiclehub_domain::key::Key;
use vehiclehub_domain::value::Value;

use super::ListQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /settings` — every component, or bare values with `?min=1`.
pub async fn list<M, P>(
    State(state): State<AppState<M, P>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    if query.is_min() {
        Json(state.settings.get_all_min()).into_response()
    } else {
        Json(state.settings.get_all()).into_response()
    }
}

/// `GET /settings/{component}`
pub async fn component<M, P>(
    State(state): State<AppState<M, P>>,
    Path(component): Path<String>,
) -> Result<Response, ApiError>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    let component = Key::parse(&component)?;
    let fields = state
        .settings
        .get_component(component.as_str())
        .ok_or_else(|| NotFoundError {
            entity: "Settings component",
            id: component.to_string(),
        })?;
    Ok(Json(fields).into_response())
}

/// `GET /settings/{component}/{field}`
pub async fn get<M, P>(
    State(state): State<AppState<M, P>>,
    Path((component, field)): Path<(String, String)>,
) -> Result<Response, ApiError>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    let component = Key::parse(&component)?;
    let field = Key::parse(&field)?;
    let entry = state
        .settings
        .get_entry(component.as_str(), field.as_str())
        .ok_or_else(|| NotFoundError {
            entity: "Setting",
            id: format!("{component}.{field}"),
        })?;
    Ok(Json(entry).into_response())
}

/// `POST /settings/{component}/{field}/{value}`: persisted before the
/// response is sent. Returns the stored entry.
pub async fn set<M, P>(
    State(state): State<AppState<M, P>>,
    Path((component, field, value)): Path<(String, String, String)>,
) -> Result<Response, ApiError>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    let (component, field) = state
        .settings
        .set(&component, &field, Value::String(value))
        .await?;
    let entry = state
        .settings
        .get_entry(component.as_str(), field.as_str())
        .ok_or_else(|| NotFoundError {
            entity: "Setting",
            id: format!("{component}.{field}"),
        })?;
    Ok(Json(entry).into_response())
}
