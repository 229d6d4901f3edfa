//! A `ubdump` session: one dump per invocation.
//!
//! **Example** - Running a dump session:
//! ```no_run
//! use ubdump::{self as ub, DumpJob, DumpRequest};
//!
//! let settings = ub::SettingsBuilder::new().path("/dev/ttyUSB0").finalize();
//! let job = DumpJob::new(DumpRequest::new(0x9f00_0000, 0x1000), "dump.bin");
//! let mut session = ub::session::factory(settings, job);
//! let status = session.run(); // exit status once the `Done` state is left
//! std::process::exit(status);
//! ```

mod events;
mod state_machine;
mod states;

pub use state_machine::{factory, DumpJob, Session};
