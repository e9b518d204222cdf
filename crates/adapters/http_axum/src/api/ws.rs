//! Session snapshots over WebSocket.
//!
//! Every text message received is answered with the current session. A
//! message whose JSON payload carries a truthy `"min"` (or the plain text
//! `min`) gets the bare key/value map instead of full entries.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;

use vehiclehub_app::ports::{SettingsPersistence, StateMirror};

use crate::state::AppState;

/// `GET /session/ws`
pub async fn upgrade<M, P>(ws: WebSocketUpgrade, State(state): State<AppState<M, P>>) -> Response
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    tracing::debug!("session websocket connection initiated");
    ws.on_upgrade(move |socket| serve(socket, state))
}

async fn serve<M, P>(mut socket: WebSocket, state: AppState<M, P>)
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    while let Some(message) = socket.recv().await {
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(error = %err, "session websocket receive failed");
                break;
            }
        };
        let request = match message {
            Message::Text(text) => text.as_str().to_owned(),
            Message::Close(_) => break,
            _ => continue,
        };
        let reply = snapshot(&state, wants_min(&request));
        match reply {
            Ok(json) => {
                if socket.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "unable to encode session snapshot");
            }
        }
    }
    tracing::debug!("session websocket closed");
}

fn snapshot<M, P>(state: &AppState<M, P>, min: bool) -> serde_json::Result<String>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    if min {
        serde_json::to_string(&state.session.get_all_min())
    } else {
        serde_json::to_string(&state.session.get_all())
    }
}

/// Whether a request asks for the minimal snapshot.
fn wants_min(request: &str) -> bool {
    match serde_json::from_str::<serde_json::Value>(request) {
        Ok(serde_json::Value::Object(payload)) => match payload.get("min") {
            Some(serde_json::Value::Bool(min)) => *min,
            Some(serde_json::Value::Number(n)) => n.as_i64() == Some(1),
            Some(serde_json::Value::String(s)) => super::is_truthy(s),
            _ => false,
        },
        _ => request.trim().eq_ignore_ascii_case("min"),
    }
}
