//! Shared application state for axum handlers.

use std::sync::Arc;

use vehiclehub_app::event_bus::InProcessEventBus;
use vehiclehub_app::ports::{SettingsPersistence, StateMirror};
use vehiclehub_app::serial::SerialQueue;
use vehiclehub_app::stores::{SessionStore, SettingsStore};

/// Application state shared across all axum handlers.
///
/// Generic over the session mirror and the settings persistence to avoid
/// dynamic dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<M, P> {
    pub session: Arc<SessionStore<M>>,
    pub settings: Arc<SettingsStore<P>>,
    pub serial: Arc<SerialQueue>,
    /// Change events from both tables, for the SSE stream.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<M, P> Clone for AppState<M, P> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            settings: Arc::clone(&self.settings),
            serial: Arc::clone(&self.serial),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<M, P> AppState<M, P>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    /// Create the state from components already shared with background tasks.
    pub fn new(
        session: Arc<SessionStore<M>>,
        settings: Arc<SettingsStore<P>>,
        serial: Arc<SerialQueue>,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self {
            session,
            settings,
            serial,
            event_bus,
        }
    }
}
