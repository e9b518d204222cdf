//! Derived values: bus directives from the key switch, and ADC conversions.

use vehiclehub_domain::conversion::{rail_current, rail_voltage};
use vehiclehub_domain::error::{HubError, ValidationError};
use vehiclehub_domain::value::Value;

use super::TriggerEngine;
use crate::hooks::Change;
use crate::ports::{AlertSink, BusBridge, SettingsPersistence, StateMirror};
use crate::stores::SetOptions;

/// Raw ADC keys and the key each one is converted into.
pub(super) const RAW_KEYS: [&str; 3] = ["main_voltage_raw", "aux_voltage_raw", "aux_current_raw"];

/// Directive sent when the key is pulled out.
pub const KEY_OUT_DIRECTIVE: &str = "pause";
/// Directive sent when the key is turned in.
pub const KEY_IN_DIRECTIVE: &str = "play";

impl<M, P, B, A> TriggerEngine<M, P, B, A>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
    B: BusBridge + 'static,
    A: AlertSink + 'static,
{
    /// Forward key-switch transitions to the bus bridge.
    pub(super) async fn on_key_state(&self, change: &Change) -> Result<(), HubError> {
        let Some(inserted) = change.entry.value.as_bool() else {
            tracing::debug!(value = %change.entry.value, "ignoring unreadable key state");
            return Ok(());
        };
        {
            let mut last = self.last_key_state.lock();
            if *last == Some(inserted) {
                return Ok(());
            }
            *last = Some(inserted);
        }
        let directive = if inserted {
            KEY_IN_DIRECTIVE
        } else {
            KEY_OUT_DIRECTIVE
        };
        tracing::info!(directive, "key state changed");
        self.bus.enqueue(directive).await
    }

    /// Convert a raw ADC reading into volts or amps.
    pub(super) fn on_raw_reading(&self, change: &Change) -> Result<(), HubError> {
        let raw = change.entry.value.as_f64().ok_or_else(|| {
            HubError::from(ValidationError::UnsupportedValue {
                key: change.name.clone(),
            })
        })?;
        let (target, converted) = match change.name.as_str() {
            "MAIN_VOLTAGE_RAW" => ("MAIN_VOLTAGE", rail_voltage(raw)),
            "AUX_VOLTAGE_RAW" => ("AUX_VOLTAGE", rail_voltage(raw)),
            "AUX_CURRENT_RAW" => ("AUX_CURRENT", rail_current(raw)),
            _ => return Ok(()),
        };
        self.session
            .set(target, Value::Float(converted), SetOptions::default())?;
        Ok(())
    }
}
