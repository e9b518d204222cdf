//! # vehiclehub-adapter-serial
//!
//! Serial adapter — the hardware side of the serial queue.
//!
//! ## Responsibilities
//! - Open a microcontroller port with [`serialport`] (8N1, short read
//!   timeout so the reader can notice shutdown)
//! - Write newline-terminated command lines
//! - Split the incoming byte stream into frames (newline- or `}`-delimited)
//!
//! ## Dependency rule
//! Depends on `vehiclehub-app` (for the serial port traits) and
//! `vehiclehub-domain` (for frame splitting).

pub mod config;
pub mod error;
pub mod port;

pub use config::SerialConfig;
pub use error::SerialPortError;
pub use port::{FrameReader, LineWriter, SerialportOpener};
