//! Ubdump is a utility to retrieve the content of memory or flash from a board
//! sitting at the U-Boot prompt, using nothing but the serial console.
//!
//! It types `md.b <address> <size>` into the bootloader shell and rebuilds the
//! binary content from the hex dump printed back, which is handy when the
//! board offers no other way to get data out (no network, no storage).
//!
//! A dump goes through two steps:
//!
//! * **Synchronization**: the shell may be printing boot messages, may have
//!   stale bytes buffered or may not be listening yet. `ubdump` asks it to
//!   `echo` a random token until that token comes back on its own line. From
//!   then on, each command is known to be answered in order.
//! * **Dump**: the hex dump is parsed line by line, every line checked to
//!   start exactly where the previous one ended, and the bytes are streamed to
//!   the output file.
//!
//! Both steps are written against the [`Channel`] trait and report progress
//! through the [`Progress`] trait, so they can be driven without a real
//! device. The [`session`] module chains them for the command line, as a small
//! state machine with one state per step.

mod channel;
mod dump;
mod error;
mod hexline;
mod progress;
mod settings;
mod sync;
mod utils;

pub mod session;

#[cfg(test)]
mod testing;

pub use channel::{Channel, Connector, SerialChannel, SerialConnector};
pub use dump::{run_dump, DumpProgress, DumpRequest};
pub use error::{Error, Result};
pub use hexline::{HexLine, LineParser};
pub use progress::{ConsoleProgress, Progress, Silent};
pub use session::{DumpJob, Session};
pub use settings::{Settings, SettingsBuilder, DEFAULT_DEVICE};
pub use sync::{synchronize, SyncToken};
pub use utils::{parse_address, parse_size};
