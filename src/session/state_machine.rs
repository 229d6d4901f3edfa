//! `ubdump` session state machine.
//!
//! A session opens the device, synchronizes with the bootloader shell, runs
//! one dump and terminates. Any failure ends the session right away; there is
//! no automatic recovery since a desynchronized shell needs a fresh session.
//!
//! ```text
//!      START
//!        |
//!        v
//!    .-------.   open error
//!    | Init  |-------------------------.
//!    '-------'                         |
//!        | channel open                |
//!        v                             |
//!  .-------------.   retries exhausted |
//!  | Synchronize |-------------------->|
//!  '-------------'                     |
//!        | token echoed                |
//!        v                             v
//!    .-------.   success / error   .------.
//!    | Dump  |-------------------->| Done |---> exit code
//!    '-------'                     '------'
//! ```

use std::path::PathBuf;

use super::events::*;
use super::states::*;
use crate::{
    channel::{Connector, SerialConnector},
    dump::DumpRequest,
    progress::{ConsoleProgress, Progress},
    settings::Settings,
    sync::SyncToken,
};

// =============================================================================
// Public Interface
// =============================================================================

/// What to dump and where to write it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DumpJob {
    pub request: DumpRequest,
    pub outfile: PathBuf,
}
impl DumpJob {
    pub fn new(request: DumpRequest, outfile: impl Into<PathBuf>) -> Self {
        DumpJob {
            request,
            outfile: outfile.into(),
        }
    }
}

/// Represents the `ubdump` session state machine. Use the `factory()` function
/// to get an instance for a serial device, then run it by calling its `run()`
/// method.
pub struct Session {
    context: Context,
    sm: SessionStates,
}
impl Session {
    /// Build a session from its parts. `factory()` is what is normally used;
    /// this allows other channel types and progress reporting.
    pub fn with_parts(
        settings: Settings,
        job: DumpJob,
        token: SyncToken,
        connector: Box<dyn Connector>,
        progress: Box<dyn Progress>,
    ) -> Self {
        Session {
            context: Context {
                settings,
                job,
                token,
                connector,
                progress,
            },
            // The session naturally starts in the `Init` state.
            sm: SessionStates::Init(InitState {}),
        }
    }

    /// The session event loop runs until the `Done` state is reached and its
    /// `should_exit` flag is set. At such point, the event loop terminates and
    /// returns an exit code: **`0`** on success, otherwise the code of the
    /// error that ended the session.
    pub fn run(&mut self) -> i32 {
        loop {
            self.sm = self.sm.step(&mut self.context);
            if let SessionStates::Done(state) = &self.sm {
                if state.should_exit {
                    return state.exit_code;
                }
            }
        }
    }
}

/// Factory function for a session over the serial device in `settings`, with
/// a random synchronization token and progress shown on the terminal.
pub fn factory(settings: Settings, job: DumpJob) -> Session {
    Session::with_parts(
        settings,
        job,
        SyncToken::random(),
        Box::new(SerialConnector),
        Box::new(ConsoleProgress::new()),
    )
}

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Data shared by all states for the whole session.
pub(crate) struct Context {
    pub settings: Settings,
    pub job: DumpJob,
    pub token: SyncToken,
    pub connector: Box<dyn Connector>,
    pub progress: Box<dyn Progress>,
}

// =============================================================================
// Private stuff
// =============================================================================

/// An enum wrapper around the states of the session state machine, used for
/// pattern matching during state transitions.
#[derive(Debug)]
enum SessionStates {
    Init(InitState),
    Synchronize(SynchronizeState),
    Dump(DumpState),
    Done(DoneState),
}
impl SessionStates {
    /// The unit of work in the state machine event loop. It runs the current
    /// state and turns the event it returns into the next state. State
    /// transitions from events are implemented using the rust `From`/`Into`
    /// pattern.
    fn step(&mut self, context: &mut Context) -> Self {
        match self {
            SessionStates::Init(state) => {
                let event = state.run(context);
                match event {
                    Event::Synchronize(ev) => SessionStates::Synchronize(ev.into()),
                    Event::Done(ev) => SessionStates::Done(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, state),
                }
            }
            SessionStates::Synchronize(state) => {
                let event = state.run(context);
                match event {
                    Event::Dump(ev) => SessionStates::Dump(ev.into()),
                    Event::Done(ev) => SessionStates::Done(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, state),
                }
            }
            SessionStates::Dump(state) => {
                let event = state.run(context);
                match event {
                    Event::Done(ev) => SessionStates::Done(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, state),
                }
            }
            SessionStates::Done(state) => {
                let event = state.run(context);
                match event {
                    Event::Exit(ev) => SessionStates::Done(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, state),
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// State from Event transitions
// -----------------------------------------------------------------------------

impl From<SynchronizeEvent> for SynchronizeState {
    fn from(event: SynchronizeEvent) -> SynchronizeState {
        SynchronizeState {
            channel: Some(event.channel),
        }
    }
}

impl From<DumpEvent> for DumpState {
    fn from(event: DumpEvent) -> DumpState {
        DumpState {
            channel: Some(event.channel),
        }
    }
}

impl From<DoneEvent> for DoneState {
    fn from(event: DoneEvent) -> DoneState {
        match event.outcome {
            Ok(()) => DoneState {
                error: None,
                exit_code: 0,
                should_exit: false,
            },
            Err(e) => DoneState {
                exit_code: e.exit_code(),
                error: Some(e),
                should_exit: false,
            },
        }
    }
}
impl From<ExitEvent> for DoneState {
    fn from(event: ExitEvent) -> DoneState {
        DoneState {
            error: None,
            exit_code: event.exit_code,
            should_exit: true,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
