//! Serial hardware port.
//!
//! The calls are blocking; the device runtime drives them from
//! `spawn_blocking` so the async executor never stalls on hardware I/O.

use std::io;

/// Write half of an open serial device.
pub trait SerialLink: Send + 'static {
    /// Write one command line (the implementation appends the terminator).
    ///
    /// # Errors
    ///
    /// Any I/O error; the runtime closes and reopens the device.
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

/// Read half of an open serial device.
pub trait FrameSource: Send + 'static {
    /// Read until one complete frame is available.
    ///
    /// Returns `Ok(None)` when the read timed out without a complete frame,
    /// which lets the caller check for shutdown between reads.
    ///
    /// # Errors
    ///
    /// Any I/O error, including end of stream; the runtime closes and reopens
    /// the device.
    fn read_frame(&mut self) -> io::Result<Option<String>>;
}

/// Opens a device, producing its two halves.
pub trait SerialPortOpener: Send + Sync + 'static {
    type Link: SerialLink;
    type Source: FrameSource;

    /// Human-readable device name for logs (e.g. `/dev/ttyUSB0`).
    fn name(&self) -> &str;

    /// Open the device.
    ///
    /// # Errors
    ///
    /// Returns the OS error when the device is missing or busy.
    fn open(&self) -> io::Result<(Self::Link, Self::Source)>;
}
