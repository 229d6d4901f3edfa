//! Helper functions to deal with serial ports and command line values.

mod literals;
mod ports;

pub use literals::{parse_address, parse_size};
pub(crate) use ports::open_and_setup_port;
