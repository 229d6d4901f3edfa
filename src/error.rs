//! Errors reported by `ubdump`.
//!
//! Every failure of a dump session ends up as one of the [`Error`] variants,
//! each of which maps to its own process exit status so that scripts driving
//! `ubdump` can tell them apart.

use std::io;

use thiserror::Error;

/// Result type for `ubdump` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the bootloader.
#[derive(Error, Debug)]
pub enum Error {
    /// The serial device could not be opened or configured.
    #[error("could not open `{path}`: {source}")]
    ChannelOpen {
        /// Device path that failed to open.
        path: String,
        /// Underlying serial port error.
        #[source]
        source: serialport::Error,
    },

    /// The shell never echoed the synchronization token back.
    #[error("no answer from the bootloader shell after {attempts} attempt(s)")]
    SyncTimeout {
        /// Number of send/read cycles performed.
        attempts: u32,
    },

    /// A line of the dump output does not follow the hex dump format.
    #[error("invalid line received [{line}]")]
    MalformedLine {
        /// The offending line, trimmed.
        line: String,
    },

    /// A line of the dump output does not continue where the previous one
    /// stopped.
    #[error("invalid address received: expected {expected:#010x}, got {received:#010x}")]
    AddressMismatch { expected: u64, received: u64 },

    /// The device went silent in the middle of a dump.
    #[error("timed out waiting for address {expected_address:#010x} ({bytes_written} bytes read)")]
    ReadTimeout {
        expected_address: u64,
        bytes_written: u64,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// The process exit status corresponding to this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ChannelOpen { .. } => 2,
            Error::SyncTimeout { .. } => 3,
            Error::MalformedLine { .. } => 4,
            Error::AddressMismatch { .. } => 5,
            Error::ReadTimeout { .. } => 6,
            Error::Io(_) => 7,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn exit_codes_are_distinct() {
    let errors = vec![
        Error::ChannelOpen {
            path: "/dev/ttyUSB0".into(),
            source: serialport::Error::new(serialport::ErrorKind::NoDevice, "gone"),
        },
        Error::SyncTimeout { attempts: 5 },
        Error::MalformedLine {
            line: "garbage".into(),
        },
        Error::AddressMismatch {
            expected: 0x10,
            received: 0x20,
        },
        Error::ReadTimeout {
            expected_address: 0x10,
            bytes_written: 0x10,
        },
        Error::Io(io::Error::new(io::ErrorKind::Other, "disk full")),
    ];
    let mut codes: Vec<i32> = errors.iter().map(Error::exit_code).collect();
    assert!(codes.iter().all(|code| *code > 1));
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}

#[test]
fn address_mismatch_message() {
    let error = Error::AddressMismatch {
        expected: 0x1010,
        received: 0x1020,
    };
    assert_eq!(
        error.to_string(),
        "invalid address received: expected 0x00001010, got 0x00001020"
    );
}
