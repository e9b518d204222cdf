//! # vehiclehub-adapter-mqtt
//!
//! MQTT adapter — publishes hub activity to a broker.
//!
//! ## Responsibilities
//! - Maintain one broker connection, reconnecting after failures
//! - Mirror published session changes to `<base>/session/<KEY>` (retained)
//! - Forward bus directives to `<base>/bus` for the vehicle-bus bridge
//! - Deliver alerts to `<base>/alert`
//!
//! ## Dependency rule
//! Same as other adapters: depends on `vehiclehub-app` and `vehiclehub-domain`.

pub mod client;
pub mod config;
pub mod error;
pub mod topics;

pub use client::MqttPublisher;
pub use config::MqttConfig;
pub use error::MqttError;
