//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `vehiclehub.toml` in the working directory (or the file named by
//! `VEHICLEHUB_CONFIG`). Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use vehiclehub_adapter_mqtt::MqttConfig;
use vehiclehub_adapter_serial::SerialConfig;
use vehiclehub_app::triggers::{RepeatDirective, TriggerConfig};

const DEFAULT_CONFIG_FILE: &str = "vehiclehub.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Settings file location.
    pub settings: SettingsFileConfig,
    /// Session history database.
    pub database: DatabaseConfig,
    /// Microcontroller serial devices.
    pub serial: SerialConfig,
    /// MQTT broker used for mirroring, bus directives and alerts.
    pub mqtt: MqttConfig,
    /// Power sequencing and alert timings.
    pub power: PowerConfig,
    /// Hook execution limits.
    pub hooks: HooksConfig,
    pub timezone: TimezoneConfig,
    /// Periodic bus directives.
    pub bus: BusConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SettingsFileConfig {
    /// JSON file holding the settings table.
    pub path: PathBuf,
}

/// `SQLite` history configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub enabled: bool,
    /// `SQLite` connection URL or file path.
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Seconds between `shutdown<Module>` and `powerOff<Module>`.
    pub shutdown_grace_secs: u64,
    /// Seconds the doors must be locked before rain raises an alert.
    pub rain_alert_after_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    /// Upper bound on concurrently running hooks and mirror writes, per store.
    pub max_concurrency: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    /// Seconds east of UTC used to stamp entries.
    pub offset_seconds: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub repeat: Vec<RepeatConfig>,
}

/// One `[[bus.repeat]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct RepeatConfig {
    pub directive: String,
    pub every_secs: u64,
}

impl Config {
    /// Load configuration from `vehiclehub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("VEHICLEHUB_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("VEHICLEHUB_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("VEHICLEHUB_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("VEHICLEHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("VEHICLEHUB_SETTINGS") {
            self.settings.path = PathBuf::from(val);
        }
        if let Some(val) = var("VEHICLEHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("VEHICLEHUB_SERIAL_PORT") {
            self.serial.port = val;
        }
        if let Some(val) = var("VEHICLEHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.hooks.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "hooks.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.serial.enabled && self.serial.port.trim().is_empty() {
            return Err(ConfigError::Validation(
                "serial.port must be set when serial is enabled".to_string(),
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Validation(
                "serial.baud_rate must be non-zero".to_string(),
            ));
        }
        if self.timezone.offset_seconds.unsigned_abs() >= 86_400 {
            return Err(ConfigError::Validation(
                "timezone.offset_seconds must be within one day".to_string(),
            ));
        }
        if let Some(repeat) = self.bus.repeat.iter().find(|r| r.every_secs == 0) {
            return Err(ConfigError::Validation(format!(
                "bus.repeat `{}` needs a non-zero period",
                repeat.directive
            )));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Tunables handed to the trigger engine.
    #[must_use]
    pub fn trigger_config(&self) -> TriggerConfig {
        TriggerConfig {
            shutdown_grace: Duration::from_secs(self.power.shutdown_grace_secs),
            rain_alert_after: Duration::from_secs(self.power.rain_alert_after_secs),
            repeats: self
                .bus
                .repeat
                .iter()
                .map(|repeat| RepeatDirective {
                    directive: repeat.directive.clone(),
                    every: Duration::from_secs(repeat.every_secs),
                })
                .collect(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "vehiclehubd=info,vehiclehub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for SettingsFileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("settings.json"),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "sqlite:vehiclehub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        let triggers = TriggerConfig::default();
        Self {
            shutdown_grace_secs: triggers.shutdown_grace.as_secs(),
            rain_alert_after_secs: triggers.rain_alert_after.as_secs(),
        }
    }
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
