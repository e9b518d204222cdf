//! Broker connection and the port implementations built on it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use vehiclehub_app::ports::{Alert, AlertSink, BusBridge, StateMirror};
use vehiclehub_domain::entry::Entry;
use vehiclehub_domain::error::HubError;

use crate::config::MqttConfig;
use crate::error::MqttError;
use crate::topics;

const CONNECT_POLL: Duration = Duration::from_millis(50);

/// Publishes to the broker on behalf of the mirror, bus and alert ports.
///
/// Cheap to clone; all clones share one connection.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    base_topic: String,
    connect_wait: Duration,
}

impl MqttPublisher {
    /// Create the client and spawn its event loop. The loop reconnects after
    /// failures until `cancel` fires.
    #[must_use]
    pub fn start(config: &MqttConfig, cancel: CancellationToken) -> (Self, JoinHandle<()>) {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.into()));
        options.set_last_will(LastWill::new(
            topics::status(&config.base_topic),
            "offline",
            QoS::AtLeastOnce,
            true,
        ));
        let (client, eventloop) = AsyncClient::new(options, 64);
        let connected = Arc::new(AtomicBool::new(false));

        let handle = tokio::spawn(run_event_loop(
            eventloop,
            client.clone(),
            Arc::clone(&connected),
            config.base_topic.clone(),
            config.reconnect_delay(),
            cancel,
        ));
        tracing::info!(
            host = %config.broker_host,
            port = config.broker_port,
            "mqtt publisher started"
        );

        (
            Self {
                client,
                connected,
                base_topic: config.base_topic.clone(),
                connect_wait: config.connect_wait(),
            },
            handle,
        )
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn wait_connected(&self) -> Result<(), MqttError> {
        let deadline = tokio::time::Instant::now() + self.connect_wait;
        while !self.is_connected() {
            if tokio::time::Instant::now() >= deadline {
                return Err(MqttError::NotConnected(self.connect_wait));
            }
            tokio::time::sleep(CONNECT_POLL).await;
        }
        Ok(())
    }

    async fn publish(&self, topic: String, payload: Vec<u8>, retain: bool) -> Result<(), MqttError> {
        self.wait_connected().await?;
        tracing::trace!(topic = %topic, "mqtt publish");
        self.client
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await
            .map_err(MqttError::Client)
    }
}

async fn run_event_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    base_topic: String,
    reconnect_delay: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    connected.store(true, Ordering::Relaxed);
                    tracing::info!("mqtt connected");
                    if let Err(err) = client.try_publish(
                        topics::status(&base_topic),
                        QoS::AtLeastOnce,
                        true,
                        "online",
                    ) {
                        tracing::warn!(error = %err, "unable to publish mqtt status");
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    if connected.swap(false, Ordering::Relaxed) {
                        tracing::warn!(error = %err, "mqtt connection lost");
                    } else {
                        tracing::debug!(error = %err, "mqtt connection attempt failed");
                    }
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(reconnect_delay) => {}
                    }
                }
            }
        }
    }
    connected.store(false, Ordering::Relaxed);
    let _ = client.try_disconnect();
    tracing::info!("mqtt publisher stopped");
}

impl StateMirror for MqttPublisher {
    async fn mirror(&self, entry: &Entry) -> Result<(), HubError> {
        let payload = serde_json::to_vec(&topics::SessionPayload::from(entry))
            .map_err(MqttError::PayloadEncode)?;
        self.publish(
            topics::session(&self.base_topic, entry.key.as_str()),
            payload,
            true,
        )
        .await?;
        Ok(())
    }
}

impl BusBridge for MqttPublisher {
    async fn enqueue(&self, directive: &str) -> Result<(), HubError> {
        self.publish(
            topics::bus(&self.base_topic),
            directive.as_bytes().to_vec(),
            false,
        )
        .await?;
        Ok(())
    }
}

impl AlertSink for MqttPublisher {
    async fn alert(&self, alert: &Alert) -> Result<(), HubError> {
        let payload = serde_json::to_vec(alert).map_err(MqttError::PayloadEncode)?;
        self.publish(topics::alert(&self.base_topic), payload, false)
            .await?;
        Ok(())
    }
}
