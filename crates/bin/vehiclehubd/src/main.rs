//! # vehiclehubd — vehiclehub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Build the session and settings stores, load persisted settings
//! - Install the trigger engine and start the repeated bus directives
//! - Open the serial devices and start their runtimes
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT): stop devices, flush settings
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use vehiclehub_adapter_http_axum::router;
use vehiclehub_adapter_http_axum::state::AppState;
use vehiclehub_adapter_mqtt::MqttPublisher;
use vehiclehub_adapter_serial::SerialportOpener;
use vehiclehub_adapter_settings_json::JsonSettingsFile;
use vehiclehub_adapter_storage_sqlite_sqlx::SqliteHistory;
use vehiclehub_app::clock::Clock;
use vehiclehub_app::event_bus::InProcessEventBus;
use vehiclehub_app::serial::{DeviceRuntime, SerialQueue};
use vehiclehub_app::stores::{SessionStore, SettingsStore};
use vehiclehub_app::triggers::TriggerEngine;
use vehiclehub_domain::time::offset_from_seconds;

use crate::config::Config;

const SHUTDOWN_WAIT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "vehiclehubd starting");

    let cancel = CancellationToken::new();
    let mut background: Vec<JoinHandle<()>> = Vec::new();

    // Mirrors
    let mqtt = if config.mqtt.enabled {
        let (publisher, task) = MqttPublisher::start(&config.mqtt, cancel.clone());
        background.push(task);
        Some(publisher)
    } else {
        None
    };
    let history = if config.database.enabled {
        let db = vehiclehub_adapter_storage_sqlite_sqlx::Config {
            database_url: config.database.url.clone(),
        }
        .build()
        .await?;
        Some(SqliteHistory::new(db.pool().clone()))
    } else {
        None
    };

    // Stores
    let event_bus = Arc::new(InProcessEventBus::default());
    let clock = Arc::new(Clock::new(offset_from_seconds(
        config.timezone.offset_seconds,
    )));
    let session = Arc::new(SessionStore::new(
        (mqtt.clone(), history),
        Arc::clone(&event_bus),
        Arc::clone(&clock),
        config.hooks.max_concurrency,
    ));
    let settings = Arc::new(SettingsStore::new(
        JsonSettingsFile::new(&config.settings.path),
        Arc::clone(&event_bus),
        clock,
        config.hooks.max_concurrency,
    ));
    let loaded = settings.load()?;
    tracing::info!(path = %config.settings.path.display(), entries = loaded, "settings loaded");

    // Serial queue and triggers
    let queue = Arc::new(SerialQueue::new(
        config.serial.drain_order,
        config.serial.await_timeout(),
    ));
    let engine = Arc::new(TriggerEngine::new(
        Arc::clone(&session),
        Arc::clone(&settings),
        Arc::clone(&queue),
        mqtt.clone(),
        mqtt,
        config.trigger_config(),
    ));
    engine.install();
    background.extend(engine.spawn_repeaters(&cancel));

    // Devices
    if config.serial.enabled {
        let ports = std::iter::once(&config.serial.port).chain(&config.serial.extra_ports);
        for (index, port) in ports.enumerate() {
            let runtime = DeviceRuntime::new(
                SerialportOpener::new(
                    port.as_str(),
                    config.serial.baud_rate,
                    config.serial.read_timeout(),
                ),
                Arc::clone(&session),
                Arc::clone(&queue),
                index == 0,
                config.serial.reopen_delay(),
                cancel.clone(),
            );
            tracing::info!(device = %runtime.device(), default = index == 0, "serial device registered");
            background.push(runtime.spawn());
        }
    } else {
        tracing::warn!("serial devices disabled, commands will be rejected");
    }

    // HTTP
    let state = AppState::new(
        Arc::clone(&session),
        Arc::clone(&settings),
        queue,
        event_bus,
    );
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "vehiclehubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown(cancel.clone()))
        .await?;

    // Shutdown
    cancel.cancel();
    for task in background {
        if tokio::time::timeout(SHUTDOWN_WAIT, task).await.is_err() {
            tracing::warn!("background task did not stop in time");
        }
    }
    if let Err(err) = settings.flush().await {
        tracing::error!(error = %err, "unable to flush settings on shutdown");
    }
    tracing::info!("vehiclehubd stopped");

    Ok(())
}

/// Resolves on SIGTERM or SIGINT, or once `cancel` fires.
async fn shutdown(cancel: CancellationToken) {
    tokio::select! {
        () = cancel.cancelled() => {}
        result = wait_for_signal() => {
            if let Err(err) = result {
                tracing::error!(error = %err, "unable to listen for shutdown signals");
                cancel.cancelled().await;
            }
        }
    }
    tracing::info!("shutdown requested");
    cancel.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        _ = sigint.recv() => tracing::info!("received SIGINT"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
