use std::fmt;

use tokio::sync::oneshot;

use vehiclehub_domain::id::MessageId;

use super::SerialError;

/// Identifies a registered serial device (by its port name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle(String);

impl DeviceHandle {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type Completion = oneshot::Sender<Result<(), SerialError>>;

/// One command line waiting to be written.
///
/// The queue owns the message until it is written or rejected; the
/// completion, when attached, is signalled exactly once.
#[derive(Debug)]
pub struct SerialMessage {
    /// Target device; `None` means the default writer.
    pub device: Option<DeviceHandle>,
    pub text: String,
    pub id: Option<MessageId>,
    completion: Option<Completion>,
}

impl SerialMessage {
    /// A message for the default device.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            device: None,
            text: text.into(),
            id: None,
            completion: None,
        }
    }

    #[must_use]
    pub fn for_device(mut self, device: DeviceHandle) -> Self {
        self.device = Some(device);
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = Some(id);
        self
    }

    /// Attach a completion channel, replacing any previous one.
    pub(crate) fn attach(&mut self) -> oneshot::Receiver<Result<(), SerialError>> {
        let (tx, rx) = oneshot::channel();
        self.completion = Some(tx);
        rx
    }

    /// Signal the outcome to whoever awaits it.
    pub(crate) fn complete(self, result: Result<(), SerialError>) {
        if let Some(completion) = self.completion {
            // the waiter may have timed out already
            let _ = completion.send(result);
        }
    }
}
