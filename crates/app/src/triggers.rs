//! Trigger engine — turns table changes into hardware actions.
//!
//! Installed once at startup, the engine registers hooks on both stores:
//!
//! - power evaluation on `ACC_POWER`, `KEY_STATE`, `LIGHT_SENSOR_ON` and any
//!   settings change
//! - `KEY_STATE` transitions mapped to bus directives
//! - raw ADC readings converted into volts and amps
//! - the rain alert on `LIGHT_SENSOR_RAIN`, `DOORS_LOCKED` and `WINDOWS_OPEN`
//!
//! Hooks hold a weak reference to the engine; dropping the engine disables
//! them.

mod alerts;
mod derived;
mod power;
mod schedule;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use vehiclehub_domain::error::HubError;
use vehiclehub_domain::power::PowerDecision;
use vehiclehub_domain::time::Timestamp;

use crate::hooks::Change;
use crate::ports::{AlertSink, BusBridge, SettingsPersistence, StateMirror};
use crate::serial::SerialQueue;
use crate::stores::{SessionStore, SettingsStore};

pub use derived::{KEY_IN_DIRECTIVE, KEY_OUT_DIRECTIVE};
pub use schedule::RepeatDirective;

/// Tunables for the trigger engine.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// Time between `shutdown<Module>` and `powerOff<Module>`.
    pub shutdown_grace: Duration,
    /// How long the doors must have been locked before rain raises an alert.
    pub rain_alert_after: Duration,
    /// Directives sent to the bus bridge on a fixed period.
    pub repeats: Vec<RepeatDirective>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            shutdown_grace: Duration::from_secs(10),
            rain_alert_after: Duration::from_secs(5 * 60),
            repeats: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct RainState {
    locked_since: Option<Timestamp>,
    alerted: bool,
}

/// Reacts to session and settings changes.
pub struct TriggerEngine<M, P, B, A> {
    session: Arc<SessionStore<M>>,
    settings: Arc<SettingsStore<P>>,
    queue: Arc<SerialQueue>,
    bus: Arc<B>,
    alerts: Arc<A>,
    config: TriggerConfig,
    // last action issued per module, so re-evaluation does not repeat it
    last_power: Mutex<HashMap<&'static str, PowerDecision>>,
    last_key_state: Mutex<Option<bool>>,
    rain: Mutex<RainState>,
}

impl<M, P, B, A> TriggerEngine<M, P, B, A>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
    B: BusBridge + 'static,
    A: AlertSink + 'static,
{
    #[must_use]
    pub fn new(
        session: Arc<SessionStore<M>>,
        settings: Arc<SettingsStore<P>>,
        queue: Arc<SerialQueue>,
        bus: B,
        alerts: A,
        config: TriggerConfig,
    ) -> Self {
        Self {
            session,
            settings,
            queue,
            bus: Arc::new(bus),
            alerts: Arc::new(alerts),
            config,
            last_power: Mutex::new(HashMap::new()),
            last_key_state: Mutex::new(None),
            rain: Mutex::new(RainState::default()),
        }
    }

    /// Register every hook on both stores.
    pub fn install(self: &Arc<Self>) {
        for key in ["acc_power", "key_state", "light_sensor_on"] {
            self.session_hook(key, |engine, _change| async move {
                engine.evaluate_power();
                Ok(())
            });
        }
        self.settings_hook("", |engine, _change| async move {
            engine.evaluate_power();
            Ok(())
        });
        self.session_hook("key_state", |engine, change| async move {
            engine.on_key_state(&change).await
        });
        for key in derived::RAW_KEYS {
            self.session_hook(key, |engine, change| async move {
                engine.on_raw_reading(&change)
            });
        }
        for key in alerts::RAIN_KEYS {
            self.session_hook(key, |engine, change| async move {
                engine.on_rain_input(&change).await
            });
        }
        tracing::info!("trigger hooks installed");
    }

    fn session_hook<F, Fut>(self: &Arc<Self>, key: &str, handler: F)
    where
        F: Fn(Arc<Self>, Change) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HubError>> + Send + 'static,
    {
        let handler = Self::weak_handler(Arc::downgrade(self), handler);
        self.session.register_hook(key, handler);
    }

    fn settings_hook<F, Fut>(self: &Arc<Self>, component: &str, handler: F)
    where
        F: Fn(Arc<Self>, Change) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HubError>> + Send + 'static,
    {
        let handler = Self::weak_handler(Arc::downgrade(self), handler);
        self.settings.register_hook(component, handler);
    }

    fn weak_handler<F, Fut>(
        engine: Weak<Self>,
        handler: F,
    ) -> impl Fn(Change) -> std::pin::Pin<Box<dyn Future<Output = Result<(), HubError>> + Send>>
    + Send
    + Sync
    + 'static
    where
        F: Fn(Arc<Self>, Change) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HubError>> + Send + 'static,
    {
        move |change| match engine.upgrade() {
            Some(engine) => Box::pin(handler(engine, change)),
            None => Box::pin(async { Ok(()) }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }
}
