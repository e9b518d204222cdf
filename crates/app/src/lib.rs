//! # vehiclehub-app
//!
//! Application layer — the reactive state engine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `StateMirror` — best-effort copy of session changes (MQTT, time-series)
//!   - `SettingsPersistence` — load/save the settings document
//!   - `BusBridge` — enqueue a directive for the vehicle-bus bridge
//!   - `AlertSink` — deliver an out-of-band alert
//!   - `SerialPortOpener` — open a serial link and its frame source
//! - Own the **stores**: `SessionStore` (live facts) and `SettingsStore`
//!   (persisted configuration), each with its own hook registry
//! - Own the **serial queue** and per-device runtimes that drain it
//! - Run the **trigger engine** that turns changes into hardware commands
//! - Provide **in-process infrastructure** (event bus, bounded task pool,
//!   clock) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `vehiclehub-domain` only (plus `tokio` for tasks and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod clock;
pub mod event_bus;
pub mod hooks;
pub mod ports;
pub mod serial;
pub mod stores;
pub mod tasks;
pub mod triggers;
