//! Power policy — decides whether a hardware module should be switched.
//!
//! A [`PowerModule`] snapshot is assembled from the current session and
//! settings values each time a trigger fires. [`decide`] is pure: calling it
//! again with the same inputs yields the same decision, so a module that is
//! already in the desired state never receives a second command.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Operator-selected policy for a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerTarget {
    /// Follow the derived vehicle state.
    #[default]
    Auto,
    /// Force on.
    On,
    /// Force off.
    Off,
}

impl fmt::Display for PowerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("AUTO"),
            Self::On => f.write_str("ON"),
            Self::Off => f.write_str("OFF"),
        }
    }
}

impl FromStr for PowerTarget {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AUTO" => Ok(Self::Auto),
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            _ => Err(ValidationError::InvalidPowerTarget(s.to_string())),
        }
    }
}

/// Why a module input could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("{0} is not set")]
    Missing(String),
    #[error("{key} has unreadable value {value:?}")]
    Invalid { key: String, value: String },
}

/// Snapshot of a module's state, rebuilt on every evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerModule {
    pub name: &'static str,
    pub is_on: Result<bool, ReadError>,
    pub target: Result<PowerTarget, ReadError>,
}

/// Outcome of a power evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerDecision {
    /// Send the power-on command.
    PowerOn,
    /// Run the graceful shutdown sequence.
    Shutdown,
    /// The target setting is unreadable: reset it to `AUTO`, do nothing else.
    ResetTarget,
    /// The module state is unreadable: do nothing this cycle.
    Skip,
    /// Already in the desired state.
    Nothing,
}

/// Decide what to do with a module.
#[must_use]
pub fn decide(should_be_on: bool, module: &PowerModule) -> PowerDecision {
    let Ok(target) = module.target else {
        return PowerDecision::ResetTarget;
    };
    let Ok(is_on) = module.is_on else {
        return PowerDecision::Skip;
    };
    match (target, is_on) {
        (PowerTarget::Auto, false) if should_be_on => PowerDecision::PowerOn,
        (PowerTarget::On, false) => PowerDecision::PowerOn,
        (PowerTarget::Auto, true) if !should_be_on => PowerDecision::Shutdown,
        (PowerTarget::Off, true) => PowerDecision::Shutdown,
        _ => PowerDecision::Nothing,
    }
}

/// Vehicle inputs that drive the automatic policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VehicleInputs {
    pub acc_power: bool,
    pub key_inserted: bool,
    pub lights_needed: bool,
}

/// A switchable hardware module.
#[derive(Debug, Clone, Copy)]
pub struct Module {
    /// Canonical name; also the settings component holding its target.
    pub name: &'static str,
    /// Suffix appended to serial commands (`powerOn<Suffix>`).
    pub command: &'static str,
    policy: fn(&VehicleInputs) -> bool,
}

impl Module {
    /// Session key reporting whether the module is powered.
    #[must_use]
    pub fn state_key(&self) -> String {
        format!("{}_POWER", self.name)
    }

    #[must_use]
    pub fn power_on_command(&self) -> String {
        format!("powerOn{}", self.command)
    }

    #[must_use]
    pub fn shutdown_command(&self) -> String {
        format!("shutdown{}", self.command)
    }

    #[must_use]
    pub fn power_off_command(&self) -> String {
        format!("powerOff{}", self.command)
    }

    /// Whether the automatic policy wants the module on.
    #[must_use]
    pub fn should_be_on(&self, inputs: &VehicleInputs) -> bool {
        (self.policy)(inputs)
    }
}

/// Settings field holding a module's [`PowerTarget`].
pub const TARGET_FIELD: &str = "POWER";

/// Every module managed by the power engine.
pub const MODULES: [Module; 5] = [
    Module {
        name: "ANGEL_EYES",
        command: "AngelEyes",
        policy: |i| i.acc_power && i.lights_needed,
    },
    Module {
        name: "BOARD",
        command: "Board",
        policy: |i| i.acc_power,
    },
    Module {
        name: "LTE",
        command: "Lte",
        policy: |i| i.acc_power || i.key_inserted,
    },
    Module {
        name: "TABLET",
        command: "Tablet",
        policy: |i| i.acc_power && i.key_inserted,
    },
    Module {
        name: "SOUND",
        command: "Sound",
        policy: |i| i.acc_power,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn module(is_on: bool, target: PowerTarget) -> PowerModule {
        PowerModule {
            name: "BOARD",
            is_on: Ok(is_on),
            target: Ok(target),
        }
    }

    #[test]
    fn should_do_nothing_when_auto_and_already_on() {
        assert_eq!(
            decide(true, &module(true, PowerTarget::Auto)),
            PowerDecision::Nothing
        );
    }

    #[test]
    fn should_power_on_when_auto_and_off_but_wanted() {
        assert_eq!(
            decide(true, &module(false, PowerTarget::Auto)),
            PowerDecision::PowerOn
        );
    }

    #[test]
    fn should_shut_down_when_auto_and_on_but_unwanted() {
        assert_eq!(
            decide(false, &module(true, PowerTarget::Auto)),
            PowerDecision::Shutdown
        );
    }

    #[test]
    fn should_force_on_regardless_of_policy() {
        assert_eq!(
            decide(false, &module(false, PowerTarget::On)),
            PowerDecision::PowerOn
        );
        assert_eq!(
            decide(false, &module(true, PowerTarget::On)),
            PowerDecision::Nothing
        );
    }

    #[test]
    fn should_force_off_regardless_of_policy() {
        assert_eq!(
            decide(true, &module(true, PowerTarget::Off)),
            PowerDecision::Shutdown
        );
        assert_eq!(
            decide(true, &module(false, PowerTarget::Off)),
            PowerDecision::Nothing
        );
    }

    #[test]
    fn should_reset_target_when_unreadable() {
        let m = PowerModule {
            name: "BOARD",
            is_on: Ok(false),
            target: Err(ReadError::Missing("BOARD.POWER".to_string())),
        };
        assert_eq!(decide(true, &m), PowerDecision::ResetTarget);
    }

    #[test]
    fn should_skip_when_state_unreadable() {
        let m = PowerModule {
            name: "BOARD",
            is_on: Err(ReadError::Missing("BOARD_POWER".to_string())),
            target: Ok(PowerTarget::On),
        };
        assert_eq!(decide(true, &m), PowerDecision::Skip);
    }

    #[test]
    fn should_parse_targets_case_insensitively() {
        assert_eq!("auto".parse::<PowerTarget>(), Ok(PowerTarget::Auto));
        assert_eq!(" Off ".parse::<PowerTarget>(), Ok(PowerTarget::Off));
        assert!("sometimes".parse::<PowerTarget>().is_err());
    }

    #[test]
    fn should_build_module_commands() {
        let angel = MODULES[0];
        assert_eq!(angel.power_on_command(), "powerOnAngelEyes");
        assert_eq!(angel.shutdown_command(), "shutdownAngelEyes");
        assert_eq!(angel.power_off_command(), "powerOffAngelEyes");
        assert_eq!(angel.state_key(), "ANGEL_EYES_POWER");
    }

    #[test]
    fn should_apply_module_policies() {
        let parked = VehicleInputs {
            acc_power: false,
            key_inserted: true,
            lights_needed: true,
        };
        let names: Vec<_> = MODULES
            .iter()
            .filter(|m| m.should_be_on(&parked))
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["LTE"]);
    }
}
