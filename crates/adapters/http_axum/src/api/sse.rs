//! Server-Sent Events (SSE) stream of table changes.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use vehiclehub_app::ports::{SettingsPersistence, StateMirror};

use crate::state::AppState;

/// `GET /session/stream` — SSE stream of session and settings changes.
///
/// Subscribes to the event bus broadcast channel and sends JSON-encoded
/// events as SSE `data:` frames, tagged with the event type. The stream
/// continues until the client disconnects.
pub async fn stream<M, P>(
    State(state): State<AppState<M, P>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    let event_rx = state.event_bus.subscribe();
    let event_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default()
                .event(event_name(&event))
                .data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize event to JSON for SSE stream");
                None
            }
        },
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "SSE subscriber lagged, some events were dropped");
            None
        }
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}

fn event_name(event: &vehiclehub_domain::event::Event) -> &'static str {
    match event.event_type {
        vehiclehub_domain::event::EventType::SessionChanged => "session",
        vehiclehub_domain::event::EventType::SettingChanged => "settings",
    }
}
