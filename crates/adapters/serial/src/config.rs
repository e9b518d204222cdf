//! Serial configuration.

use std::time::Duration;

use serde::Deserialize;

use vehiclehub_app::serial::DrainOrder;

/// Configuration for the serial devices.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Open the devices at all.
    pub enabled: bool,
    /// Default writer device (e.g. `/dev/ttyUSB0`).
    pub port: String,
    /// Additional devices that are read from and can be addressed explicitly.
    pub extra_ports: Vec<String>,
    pub baud_rate: u32,
    /// Read timeout; bounds how long shutdown waits for a reader.
    pub read_timeout_ms: u64,
    /// Delay before reopening a failed device.
    pub reopen_delay_ms: u64,
    /// Upper bound for `await` writes.
    pub await_timeout_ms: u64,
    pub drain_order: DrainOrder,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: "/dev/ttyUSB0".to_string(),
            extra_ports: Vec::new(),
            baud_rate: 115_200,
            read_timeout_ms: 200,
            reopen_delay_ms: 1000,
            await_timeout_ms: 5000,
            drain_order: DrainOrder::Lifo,
        }
    }
}

impl SerialConfig {
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    #[must_use]
    pub fn reopen_delay(&self) -> Duration {
        Duration::from_millis(self.reopen_delay_ms)
    }

    #[must_use]
    pub fn await_timeout(&self) -> Duration {
        Duration::from_millis(self.await_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = SerialConfig::default();
        assert!(config.enabled);
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.await_timeout(), Duration::from_secs(5));
        assert_eq!(config.drain_order, DrainOrder::Lifo);
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            port = "/dev/ttyACM0"
            extra_ports = ["/dev/ttyACM1"]
            baud_rate = 9600
            reopen_delay_ms = 250
            drain_order = "fifo"
        "#;
        let config: SerialConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.extra_ports, vec!["/dev/ttyACM1"]);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.reopen_delay(), Duration::from_millis(250));
        assert_eq!(config.drain_order, DrainOrder::Fifo);
        assert_eq!(config.await_timeout_ms, 5000);
    }
}
