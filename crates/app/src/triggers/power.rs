//! Module power evaluation.

use std::sync::Arc;

use vehiclehub_domain::power::{
    MODULES, Module, PowerDecision, PowerModule, PowerTarget, ReadError, TARGET_FIELD,
    VehicleInputs, decide,
};
use vehiclehub_domain::value::Value;

use super::TriggerEngine;
use crate::ports::{AlertSink, BusBridge, SettingsPersistence, StateMirror};
use crate::serial::SerialMessage;

impl<M, P, B, A> TriggerEngine<M, P, B, A>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
    B: BusBridge + 'static,
    A: AlertSink + 'static,
{
    /// Current automatic-policy inputs.
    #[must_use]
    pub fn vehicle_inputs(&self) -> VehicleInputs {
        VehicleInputs {
            acc_power: self.session.get_bool("ACC_POWER", false),
            key_inserted: self.session.get_bool("KEY_STATE", false),
            lights_needed: self.session.get_bool("LIGHT_SENSOR_ON", false),
        }
    }

    /// Read a module's state and target as they are right now.
    #[must_use]
    pub fn read_module(&self, module: &Module) -> PowerModule {
        let state_key = module.state_key();
        let is_on = match self.session.get(&state_key) {
            None => Err(ReadError::Missing(state_key)),
            Some(value) => value.as_bool().ok_or_else(|| ReadError::Invalid {
                key: state_key,
                value: value.to_string(),
            }),
        };
        let target_key = format!("{}.{TARGET_FIELD}", module.name);
        let target = match self.settings.get(module.name, TARGET_FIELD) {
            None => Err(ReadError::Missing(target_key)),
            Some(value) => {
                let raw = value.to_string();
                raw.parse::<PowerTarget>().map_err(|_| ReadError::Invalid {
                    key: target_key,
                    value: raw,
                })
            }
        };
        PowerModule {
            name: module.name,
            is_on,
            target,
        }
    }

    /// Decide every module and issue the resulting commands.
    ///
    /// A decision identical to the last one issued for the module is not
    /// repeated until the module reaches its desired state, or until its
    /// command could not be written.
    pub fn evaluate_power(self: &Arc<Self>) {
        let inputs = self.vehicle_inputs();
        let actions: Vec<(Module, PowerModule, PowerDecision)> = {
            let mut last = self.last_power.lock();
            MODULES
                .iter()
                .filter_map(|module| {
                    let state = self.read_module(module);
                    let decision = decide(module.should_be_on(&inputs), &state);
                    match decision {
                        PowerDecision::Nothing => {
                            last.remove(module.name);
                            None
                        }
                        PowerDecision::PowerOn | PowerDecision::Shutdown => {
                            if last.insert(module.name, decision) == Some(decision) {
                                None
                            } else {
                                Some((*module, state, decision))
                            }
                        }
                        PowerDecision::ResetTarget | PowerDecision::Skip => {
                            Some((*module, state, decision))
                        }
                    }
                })
                .collect()
        };

        for (module, state, decision) in actions {
            self.apply(module, &state, decision);
        }
    }

    fn apply(self: &Arc<Self>, module: Module, state: &PowerModule, decision: PowerDecision) {
        match decision {
            PowerDecision::PowerOn => {
                tracing::info!(module = module.name, "powering on");
                self.send(module, decision, module.power_on_command());
            }
            PowerDecision::Shutdown => {
                tracing::info!(module = module.name, "shutting down");
                self.send(module, decision, module.shutdown_command());
                let engine = Arc::clone(self);
                let grace = self.config.shutdown_grace;
                tokio::spawn(async move {
                    tokio::time::sleep(grace).await;
                    engine.power_off_after_grace(module);
                });
            }
            PowerDecision::ResetTarget => {
                if let Err(err) = &state.target {
                    tracing::warn!(module = module.name, reason = %err, "resetting power target to AUTO");
                }
                let settings = Arc::clone(&self.settings);
                tokio::spawn(async move {
                    let auto = Value::from(PowerTarget::Auto.to_string());
                    if let Err(err) = settings.set(module.name, TARGET_FIELD, auto).await {
                        tracing::error!(module = module.name, error = %err, "unable to reset power target");
                    }
                });
            }
            PowerDecision::Skip => {
                if let Err(err) = &state.is_on {
                    tracing::debug!(module = module.name, reason = %err, "module state unknown, skipping");
                }
            }
            PowerDecision::Nothing => {}
        }
    }

    /// Cut power once the grace period is over, unless the module no longer
    /// needs to shut down.
    fn power_off_after_grace(self: &Arc<Self>, module: Module) {
        let state = self.read_module(&module);
        let decision = decide(module.should_be_on(&self.vehicle_inputs()), &state);
        if decision == PowerDecision::Shutdown {
            self.send(module, decision, module.power_off_command());
        } else {
            tracing::info!(module = module.name, ?decision, "power off cancelled");
            self.forget(module.name, PowerDecision::Shutdown);
        }
    }

    /// Queue a power command. A rejected, failed or unacknowledged write
    /// clears the remembered decision so the next evaluation retries it.
    fn send(self: &Arc<Self>, module: Module, decision: PowerDecision, command: String) {
        let message = SerialMessage::new(command.clone());
        match self.queue.submit(message, self.queue.await_timeout()) {
            Ok(written) => {
                let engine = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(err) = written.await {
                        tracing::warn!(command = %command, error = %err, "power command not written");
                        engine.forget(module.name, decision);
                    }
                });
            }
            Err(err) => {
                tracing::warn!(command = %command, error = %err, "unable to queue power command");
                self.forget(module.name, decision);
            }
        }
    }

    fn forget(&self, module: &'static str, decision: PowerDecision) {
        let mut last = self.last_power.lock();
        if last.get(module) == Some(&decision) {
            last.remove(module);
        }
    }
}
