use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use vehiclehub_domain::id::MessageId;

use super::{DeviceHandle, SerialError, SerialMessage};

/// Which pending message a writer takes next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrainOrder {
    /// Most recently pushed first.
    #[default]
    Lifo,
    /// Oldest first.
    Fifo,
}

/// Connection state of a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    #[default]
    Closed,
    Opening,
    Open,
}

/// Point-in-time view of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSnapshot {
    pub device: String,
    pub state: DeviceState,
    pub pending: usize,
    pub default: bool,
}

#[derive(Default)]
struct DeviceSlot {
    pending: VecDeque<SerialMessage>,
    notify: Arc<Notify>,
    state: DeviceState,
}

#[derive(Default)]
struct Devices {
    slots: HashMap<DeviceHandle, DeviceSlot>,
    default_device: Option<DeviceHandle>,
}

/// Outbound message queues for every device, behind one shared lock.
pub struct SerialQueue {
    devices: Mutex<Devices>,
    order: DrainOrder,
    await_timeout: Duration,
}

impl Default for SerialQueue {
    fn default() -> Self {
        Self::new(DrainOrder::default(), Duration::from_millis(5000))
    }
}

impl SerialQueue {
    #[must_use]
    pub fn new(order: DrainOrder, await_timeout: Duration) -> Self {
        Self {
            devices: Mutex::new(Devices::default()),
            order,
            await_timeout,
        }
    }

    /// Register a device and return the notifier its writer waits on.
    ///
    /// The first device registered becomes the default writer unless
    /// another one is registered with `default = true`.
    pub fn register(&self, device: DeviceHandle, default: bool) -> Arc<Notify> {
        let mut devices = self.devices.lock();
        if default || devices.default_device.is_none() {
            devices.default_device = Some(device.clone());
        }
        let slot = devices.slots.entry(device).or_default();
        Arc::clone(&slot.notify)
    }

    /// Default bound for [`SerialQueue::await_text`].
    #[must_use]
    pub fn await_timeout(&self) -> Duration {
        self.await_timeout
    }

    #[must_use]
    pub fn default_device(&self) -> Option<DeviceHandle> {
        self.devices.lock().default_device.clone()
    }

    /// Queue a message and wake its device writer. Never blocks.
    ///
    /// A message without an id gets a fresh one. On rejection the message's
    /// completion, if any, receives the same error.
    ///
    /// # Errors
    ///
    /// [`SerialError::EmptyMessage`] for blank text,
    /// [`SerialError::UnknownDevice`] for an unregistered target and
    /// [`SerialError::NoDevice`] when no device is registered at all.
    pub fn push(&self, mut message: SerialMessage) -> Result<(), SerialError> {
        let trimmed = message.text.trim();
        if trimmed.is_empty() {
            return reject(message, SerialError::EmptyMessage);
        }
        if trimmed.len() != message.text.len() {
            message.text = trimmed.to_string();
        }
        let id = *message.id.get_or_insert_with(MessageId::new);

        let mut devices = self.devices.lock();
        let Some(target) = message
            .device
            .clone()
            .or_else(|| devices.default_device.clone())
        else {
            drop(devices);
            tracing::warn!(%id, text = %message.text, "no serial device, dropping message");
            return reject(message, SerialError::NoDevice);
        };
        let Some(slot) = devices.slots.get_mut(&target) else {
            drop(devices);
            return reject(message, SerialError::UnknownDevice(target.to_string()));
        };
        tracing::debug!(%id, device = %target, text = %message.text, "serial message queued");
        message.device = Some(target);
        slot.pending.push_back(message);
        slot.notify.notify_one();
        Ok(())
    }

    /// Queue `text` for the default device.
    ///
    /// # Errors
    ///
    /// See [`SerialQueue::push`].
    pub fn push_text(&self, text: &str) -> Result<(), SerialError> {
        self.push(SerialMessage::new(text))
    }

    /// Queue a message and wait until it has been written or `timeout`
    /// elapsed.
    ///
    /// # Errors
    ///
    /// The push rejection, the write failure, or [`SerialError::Timeout`].
    pub async fn await_message(
        &self,
        message: SerialMessage,
        timeout: Duration,
    ) -> Result<(), SerialError> {
        self.submit(message, timeout)?.await
    }

    /// Queue a message now and return a future resolving once it has been
    /// written, failed, or `timeout` elapsed.
    ///
    /// The future does not borrow the queue, so it can be awaited from a
    /// detached task.
    ///
    /// # Errors
    ///
    /// The push rejection, see [`SerialQueue::push`].
    pub fn submit(
        &self,
        mut message: SerialMessage,
        timeout: Duration,
    ) -> Result<impl Future<Output = Result<(), SerialError>> + Send + 'static, SerialError> {
        let completion = message.attach();
        self.push(message)?;
        Ok(async move {
            match tokio::time::timeout(timeout, completion).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(SerialError::Dropped),
                Err(_) => Err(SerialError::Timeout(timeout)),
            }
        })
    }

    /// Queue `text` for the default device and wait for the write, bounded
    /// by the configured await timeout.
    ///
    /// # Errors
    ///
    /// See [`SerialQueue::await_message`].
    pub async fn await_text(&self, text: &str) -> Result<(), SerialError> {
        self.await_message(SerialMessage::new(text), self.await_timeout)
            .await
    }

    /// Take the next message for `device` according to the drain order.
    pub fn pop(&self, device: &DeviceHandle) -> Option<SerialMessage> {
        let mut devices = self.devices.lock();
        let slot = devices.slots.get_mut(device)?;
        match self.order {
            DrainOrder::Lifo => slot.pending.pop_back(),
            DrainOrder::Fifo => slot.pending.pop_front(),
        }
    }

    #[must_use]
    pub fn pending(&self, device: &DeviceHandle) -> usize {
        self.devices
            .lock()
            .slots
            .get(device)
            .map_or(0, |slot| slot.pending.len())
    }

    pub fn set_state(&self, device: &DeviceHandle, state: DeviceState) {
        if let Some(slot) = self.devices.lock().slots.get_mut(device) {
            slot.state = state;
        }
    }

    #[must_use]
    pub fn state(&self, device: &DeviceHandle) -> Option<DeviceState> {
        self.devices.lock().slots.get(device).map(|slot| slot.state)
    }

    /// State of every registered device, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DeviceSnapshot> {
        let devices = self.devices.lock();
        let mut list: Vec<DeviceSnapshot> = devices
            .slots
            .iter()
            .map(|(handle, slot)| DeviceSnapshot {
                device: handle.to_string(),
                state: slot.state,
                pending: slot.pending.len(),
                default: devices.default_device.as_ref() == Some(handle),
            })
            .collect();
        list.sort_by(|a, b| a.device.cmp(&b.device));
        list
    }
}

fn reject(message: SerialMessage, err: SerialError) -> Result<(), SerialError> {
    message.complete(Err(err.clone()));
    Err(err)
}
