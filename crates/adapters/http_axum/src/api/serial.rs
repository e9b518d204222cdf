//! Direct serial commands.

use axum::Json;
use axum::extract::{Path, State};

use vehiclehub_app::ports::{SettingsPersistence, StateMirror};

use crate::error::{ApiError, Outcome};
use crate::state::AppState;

/// `GET|POST /serial/{command}` — write `command` to the default device and
/// wait for the write to complete.
pub async fn send<M, P>(
    State(state): State<AppState<M, P>>,
    Path(command): Path<String>,
) -> Result<Json<Outcome<&'static str>>, ApiError>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    state.serial.await_text(&command).await?;
    Ok(Json(Outcome::done()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::testing::{TestApp, body_json};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn should_confirm_written_command() {
        let app = TestApp::with_device();

        let response = app.post("/serial/powerOnBoard").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"OK": true, "output": "OK"}));
        assert_eq!(app.written(), vec!["powerOnBoard"]);
        app.shutdown();
    }

    #[tokio::test]
    async fn should_fail_without_device() {
        let app = TestApp::new();

        let response = app.get("/serial/ping").await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["OK"], false);
    }
}
