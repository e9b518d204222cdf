//! Serial command queue and per-device runtimes.
//!
//! Producers push [`SerialMessage`]s onto a per-device queue and return
//! immediately (or wait for the write with [`SerialQueue::await_message`]).
//! Each [`DeviceRuntime`] owns one device: it opens it, drains its queue
//! into the link and feeds decoded frames back into a [`FrameSink`].

mod device;
mod error;
mod message;
mod queue;

pub use device::DeviceRuntime;
pub use error::SerialError;
pub use message::{DeviceHandle, SerialMessage};
pub use queue::{DeviceSnapshot, DeviceState, DrainOrder, SerialQueue};

/// Receives complete frames read from a device.
pub trait FrameSink: Send + Sync + 'static {
    fn ingest(&self, frame: &str);
}

impl<T: FrameSink> FrameSink for std::sync::Arc<T> {
    fn ingest(&self, frame: &str) {
        (**self).ingest(frame);
    }
}
