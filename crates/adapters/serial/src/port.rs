//! `serialport`-backed implementation of the serial port traits.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use vehiclehub_app::ports::{FrameSource, SerialLink, SerialPortOpener};
use vehiclehub_domain::frame::FrameSplitter;

use crate::error::SerialPortError;

/// Opens one named port at a fixed baud rate.
#[derive(Debug, Clone)]
pub struct SerialportOpener {
    port: String,
    baud_rate: u32,
    read_timeout: Duration,
}

impl SerialportOpener {
    #[must_use]
    pub fn new(port: impl Into<String>, baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            read_timeout,
        }
    }
}

impl SerialPortOpener for SerialportOpener {
    type Link = LineWriter<Box<dyn SerialPort>>;
    type Source = FrameReader<Box<dyn SerialPort>>;

    fn name(&self) -> &str {
        &self.port
    }

    fn open(&self) -> io::Result<(Self::Link, Self::Source)> {
        tracing::debug!(port = %self.port, baud_rate = self.baud_rate, "opening serial port");
        let port = serialport::new(&self.port, self.baud_rate)
            .timeout(self.read_timeout)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .open()
            .map_err(|source| SerialPortError::Open {
                port: self.port.clone(),
                source,
            })?;
        let reader = port.try_clone().map_err(|source| SerialPortError::Clone {
            port: self.port.clone(),
            source,
        })?;
        Ok((LineWriter::new(port), FrameReader::new(reader)))
    }
}

/// Writes newline-terminated command lines.
pub struct LineWriter<W> {
    inner: W,
}

impl<W> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send + 'static> SerialLink for LineWriter<W> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.inner.flush()
    }
}

/// Reads bytes and yields complete frames.
pub struct FrameReader<R> {
    inner: R,
    splitter: FrameSplitter,
    ready: VecDeque<String>,
    buf: [u8; 256],
}

impl<R> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            splitter: FrameSplitter::new(),
            ready: VecDeque::new(),
            buf: [0; 256],
        }
    }
}

impl<R: Read + Send + 'static> FrameSource for FrameReader<R> {
    fn read_frame(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Ok(Some(frame));
            }
            let read = match self.inner.read(&mut self.buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "serial stream closed",
                    ));
                }
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::TimedOut => return Ok(None),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            self.ready.extend(self.splitter.extend(&self.buf[..read]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn should_terminate_each_line() {
        let mut writer = LineWriter::new(Vec::new());
        writer.write_line("powerOnBoard").unwrap();
        writer.write_line("shutdownBoard").unwrap();
        assert_eq!(writer.into_inner(), b"powerOnBoard\nshutdownBoard\n");
    }

    #[test]
    fn should_yield_frames_then_fail_at_end_of_stream() {
        let input = b"{\"acc_power\":true}{\"rpm\":800}\n\n{\"key_state\":false}\n".to_vec();
        let mut reader = FrameReader::new(Cursor::new(input));

        assert_eq!(
            reader.read_frame().unwrap().as_deref(),
            Some("{\"acc_power\":true}")
        );
        assert_eq!(reader.read_frame().unwrap().as_deref(), Some("{\"rpm\":800}"));
        assert_eq!(
            reader.read_frame().unwrap().as_deref(),
            Some("{\"key_state\":false}")
        );
        let err = reader.read_frame().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    struct TimingOut;

    impl Read for TimingOut {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
        }
    }

    #[test]
    fn should_report_no_frame_on_timeout() {
        let mut reader = FrameReader::new(TimingOut);
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn should_fail_to_open_missing_port() {
        let opener = SerialportOpener::new("/dev/vehiclehub-missing", 9600, Duration::from_millis(10));
        assert!(opener.open().is_err());
        assert_eq!(opener.name(), "/dev/vehiclehub-missing");
    }
}
