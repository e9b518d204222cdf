//! Serial adapter error types.

use std::io;

/// Errors specific to opening a serial port.
#[derive(Debug, thiserror::Error)]
pub enum SerialPortError {
    #[error("unable to open serial port {port}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("unable to clone serial port handle for {port}")]
    Clone {
        port: String,
        #[source]
        source: serialport::Error,
    },
}

impl From<SerialPortError> for io::Error {
    fn from(err: SerialPortError) -> Self {
        let kind = match &err {
            SerialPortError::Open { source, .. } | SerialPortError::Clone { source, .. } => {
                match source.kind() {
                    serialport::ErrorKind::NoDevice => io::ErrorKind::NotFound,
                    serialport::ErrorKind::Io(kind) => kind,
                    _ => io::ErrorKind::Other,
                }
            }
        };
        io::Error::new(kind, err)
    }
}
