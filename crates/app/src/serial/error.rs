use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Why a serial message was not written.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SerialError {
    #[error("no serial device available")]
    NoDevice,

    #[error("unknown serial device {0}")]
    UnknownDevice(String),

    #[error("serial message must not be empty")]
    EmptyMessage,

    #[error("unable to write to serial device")]
    Write(#[source] Arc<io::Error>),

    #[error("serial write not confirmed within {0:?}")]
    Timeout(Duration),

    #[error("serial message dropped before it was written")]
    Dropped,
}

impl From<io::Error> for SerialError {
    fn from(err: io::Error) -> Self {
        Self::Write(Arc::new(err))
    }
}
