//! Rain alert: raining, doors locked for a while, windows still open.

use std::sync::Arc;

use vehiclehub_domain::error::HubError;
use vehiclehub_domain::time::{now, utc};

use super::{RainState, TriggerEngine};
use crate::hooks::Change;
use crate::ports::{Alert, AlertSink, BusBridge, SettingsPersistence, StateMirror};

pub(super) const RAIN_KEYS: [&str; 3] = ["light_sensor_rain", "doors_locked", "windows_open"];

impl<M, P, B, A> TriggerEngine<M, P, B, A>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
    B: BusBridge + 'static,
    A: AlertSink + 'static,
{
    pub(super) async fn on_rain_input(self: &Arc<Self>, change: &Change) -> Result<(), HubError> {
        if change.name == "DOORS_LOCKED" && change.entry.value.as_bool() != Some(true) {
            *self.rain.lock() = RainState::default();
            return Ok(());
        }
        self.check_rain().await
    }

    /// Raise the rain alert once per lock period when every condition holds.
    ///
    /// # Errors
    ///
    /// Propagates the alert sink failure.
    pub async fn check_rain(self: &Arc<Self>) -> Result<(), HubError> {
        let raining = self.session.get_bool("LIGHT_SENSOR_RAIN", false);
        let locked = self.session.get_bool("DOORS_LOCKED", false);
        let open = self.session.get_bool("WINDOWS_OPEN", false);
        if !locked {
            return Ok(());
        }

        let at = now(utc());
        let fire = {
            let mut rain = self.rain.lock();
            let Some(since) = rain.locked_since else {
                rain.locked_since = Some(at);
                drop(rain);
                self.schedule_rain_recheck();
                return Ok(());
            };
            let locked_for = (at - since).to_std().unwrap_or_default();
            let fire = raining && open && !rain.alerted && locked_for >= self.config.rain_alert_after;
            if fire {
                rain.alerted = true;
            }
            fire
        };
        if !fire {
            return Ok(());
        }

        tracing::warn!("rain detected while locked with windows open");
        self.alerts
            .alert(&Alert {
                title: "Rain detected".to_string(),
                message: "It is raining and the windows are open while the vehicle is locked."
                    .to_string(),
                at,
            })
            .await
    }

    fn schedule_rain_recheck(self: &Arc<Self>) {
        let engine = Arc::downgrade(self);
        let delay = self.config.rain_alert_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(engine) = engine.upgrade() else {
                return;
            };
            if let Err(err) = engine.check_rain().await {
                tracing::warn!(error = %err, "unable to deliver rain alert");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use vehiclehub_domain::value::Value;

    use crate::stores::SetOptions;
    use crate::triggers::TriggerConfig;
    use crate::triggers::testing::{Rig, settle};

    fn rig(after: Duration) -> Rig {
        let rig = Rig::new(TriggerConfig {
            rain_alert_after: after,
            ..TriggerConfig::default()
        });
        rig.engine.install();
        rig
    }

    fn set(rig: &Rig, key: &str, value: bool) {
        rig.session
            .set(key, Value::from(value), SetOptions::default())
            .unwrap();
    }

    #[tokio::test]
    async fn should_alert_once_after_lock_delay() {
        let rig = rig(Duration::from_millis(40));

        set(&rig, "DOORS_LOCKED", true);
        settle().await;
        set(&rig, "WINDOWS_OPEN", true);
        set(&rig, "LIGHT_SENSOR_RAIN", true);
        tokio::time::sleep(Duration::from_millis(120)).await;
        set(&rig, "LIGHT_SENSOR_RAIN", true);
        settle().await;

        assert_eq!(rig.alerts.0.lock().len(), 1);
    }

    #[tokio::test]
    async fn should_not_alert_for_recent_lock() {
        let rig = rig(Duration::from_secs(300));

        set(&rig, "DOORS_LOCKED", true);
        set(&rig, "WINDOWS_OPEN", true);
        set(&rig, "LIGHT_SENSOR_RAIN", true);
        settle().await;

        assert!(rig.alerts.0.lock().is_empty());
    }

    #[tokio::test]
    async fn should_not_alert_with_windows_closed() {
        let rig = rig(Duration::from_millis(10));

        set(&rig, "DOORS_LOCKED", true);
        set(&rig, "WINDOWS_OPEN", false);
        set(&rig, "LIGHT_SENSOR_RAIN", true);
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(rig.alerts.0.lock().is_empty());
    }
}
