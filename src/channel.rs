//! The line-oriented link to the bootloader shell.
//!
//! The protocol code only ever needs to send a command and read back lines,
//! so it is written against the [`Channel`] trait rather than against a serial
//! port directly. [`SerialChannel`] is the implementation used with a real
//! device.

use std::{
    fmt,
    io::{self, prelude::*, BufReader},
};

use log::trace;
use serialport::SerialPort;

use crate::{error::Result, settings::Settings, utils::open_and_setup_port};

// =============================================================================
// Public Interface
// =============================================================================

/// An ordered, reliable, line-oriented link to the remote shell.
pub trait Channel {
    /// Write `command` as-is to the remote and flush it.
    fn send(&mut self, command: &str) -> io::Result<()>;

    /// Read the next line, including its terminator when one was received.
    ///
    /// Returns `Ok(None)` when nothing arrived before the read timeout expired
    /// or the link reached EOF. A line interrupted by the timeout is returned
    /// as far as it was received.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Opens a [`Channel`] to the device described by the settings.
pub trait Connector {
    /// Open the device named in `settings`, ready for synchronization.
    fn connect(&self, settings: &Settings) -> Result<Box<dyn Channel>>;
}

/// A [`Channel`] over a serial port, already opened and configured.
pub struct SerialChannel {
    reader: BufReader<Box<dyn SerialPort>>,
}
impl SerialChannel {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        SerialChannel {
            reader: BufReader::new(port),
        }
    }
}
impl Channel for SerialChannel {
    fn send(&mut self, command: &str) -> io::Result<()> {
        trace!("--> {:?}", command);
        let port = self.reader.get_mut();
        port.write_all(command.as_bytes())?;
        port.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let line = read_line_from(&mut self.reader)?;
        trace!("<-- {:?}", line);
        Ok(line)
    }
}
impl fmt::Debug for SerialChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let port = self.reader.get_ref();
        f.debug_tuple("SerialChannel")
            .field(&port.name())
            .field(&port.baud_rate())
            .field(&port.data_bits())
            .field(&port.stop_bits())
            .field(&port.parity())
            .field(&port.flow_control())
            .finish()
    }
}

/// The [`Connector`] for real serial devices.
#[derive(Debug, Default, Copy, Clone)]
pub struct SerialConnector;
impl Connector for SerialConnector {
    fn connect(&self, settings: &Settings) -> Result<Box<dyn Channel>> {
        let port = open_and_setup_port(settings)?;
        Ok(Box::new(SerialChannel::new(port)))
    }
}

// =============================================================================
// Private stuff
// =============================================================================

/// Read up to and including the next `\n` from a reader whose reads may time
/// out. A timeout with nothing received, like EOF, gives `None`.
fn read_line_from<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut raw: Vec<u8> = Vec::new();
    match reader.read_until(b'\n', &mut raw) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(String::from_utf8_lossy(&raw).into_owned())),
        // Whatever was received before the timeout is left in `raw`
        Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
            if raw.is_empty() {
                Ok(None)
            } else {
                Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
            }
        }
        Err(e) => Err(e),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Behaves like a serial port with a read timeout: each read hands out
    /// the next chunk, and once they are used up every read times out.
    struct TimingOutPort {
        chunks: VecDeque<io::Result<Vec<u8>>>,
    }
    impl TimingOutPort {
        fn new(chunks: Vec<io::Result<&[u8]>>) -> BufReader<Self> {
            BufReader::new(TimingOutPort {
                chunks: chunks.into_iter().map(|c| c.map(<[u8]>::to_vec)).collect(),
            })
        }
    }
    impl Read for TimingOutPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(Ok(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "Operation timed out")),
            }
        }
    }

    fn eof() -> io::Result<&'static [u8]> {
        Ok(&b""[..])
    }

    #[test]
    fn full_lines_keep_their_terminator() {
        let mut port = TimingOutPort::new(vec![Ok(&b"=> echo x\r\nx\r\n"[..])]);
        assert_eq!(read_line_from(&mut port).unwrap().as_deref(), Some("=> echo x\r\n"));
        assert_eq!(read_line_from(&mut port).unwrap().as_deref(), Some("x\r\n"));
    }

    #[test]
    fn line_split_across_reads() {
        let mut port = TimingOutPort::new(vec![Ok(&b"00001000: 00"[..]), Ok(&b" 01\r\n"[..])]);
        assert_eq!(
            read_line_from(&mut port).unwrap().as_deref(),
            Some("00001000: 00 01\r\n")
        );
    }

    #[test]
    fn partial_line_cut_by_timeout() {
        let mut port = TimingOutPort::new(vec![Ok(&b"=> "[..])]);
        assert_eq!(read_line_from(&mut port).unwrap().as_deref(), Some("=> "));
        assert_eq!(read_line_from(&mut port).unwrap(), None);
    }

    #[test]
    fn timeout_without_data_is_none() {
        let mut port = TimingOutPort::new(vec![]);
        assert_eq!(read_line_from(&mut port).unwrap(), None);
    }

    #[test]
    fn eof_is_none() {
        let mut port = TimingOutPort::new(vec![eof()]);
        assert_eq!(read_line_from(&mut port).unwrap(), None);
    }

    #[test]
    fn other_errors_are_propagated() {
        let mut port = TimingOutPort::new(vec![Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "device unplugged",
        ))]);
        let error = read_line_from(&mut port).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::BrokenPipe);
    }
}
