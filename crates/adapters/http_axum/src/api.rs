//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod serial;
#[allow(clippy::missing_errors_doc)]
pub mod session;
#[allow(clippy::missing_errors_doc)]
pub mod settings;
pub mod sse;
pub mod stats;
pub mod ws;

use axum::Router;
use axum::routing::{get, post};
use serde::Deserialize;

use vehiclehub_app::ports::{SettingsPersistence, StateMirror};

use crate::state::AppState;

/// Build the API router.
pub fn routes<M, P>() -> Router<AppState<M, P>>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    Router::new()
        // Session
        .route("/session", get(session::list::<M, P>))
        .route("/session/ws", get(ws::upgrade::<M, P>))
        .route("/session/stream", get(sse::stream::<M, P>))
        .route(
            "/session/{name}",
            get(session::get::<M, P>).post(session::set::<M, P>),
        )
        // Settings
        .route("/settings", get(settings::list::<M, P>))
        .route("/settings/{component}", get(settings::component::<M, P>))
        .route(
            "/settings/{component}/{field}",
            get(settings::get::<M, P>),
        )
        .route(
            "/settings/{component}/{field}/{value}",
            post(settings::set::<M, P>),
        )
        // Serial
        .route(
            "/serial/{command}",
            get(serial::send::<M, P>).post(serial::send::<M, P>),
        )
        // Stats
        .route("/stats", get(stats::get::<M, P>))
}

/// `?min=1` switches listings to bare key/value maps.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub min: Option<String>,
}

impl ListQuery {
    #[must_use]
    pub fn is_min(&self) -> bool {
        self.min.as_deref().is_some_and(is_truthy)
    }
}

pub(crate) fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
