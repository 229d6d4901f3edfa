//! States for the `ubdump` session state machine.
//!
//! This modules is private and restricted to the [`session`](crate::session)
//! scope. The public interface of the state machine is provided by
//! [`session`](crate::session).
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use std::{
    fmt,
    fs::File,
    io::{BufWriter, Write},
};

use log::{error, info};

use super::events::*;
use super::state_machine::{Context, DumpJob};

use crate::{
    channel::Channel,
    dump::run_dump,
    error::{Error, Result},
    progress::Progress,
    sync::synchronize,
};

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Trait adding the ability for a state to be `run` after a transition into it.
pub(crate) trait Runnable {
    /// A state implements this method so it can be `run` after the state
    /// machine transitions into it.
    ///
    /// During this call, the state does its work and then requests a
    /// transition to a `new state` by returning the appropriate `event`. The
    /// `event` is consumed to create the `new state` using the corresponding
    /// [`From`] trait implementation (provided such implementation exists).
    fn run(&mut self, context: &mut Context) -> Event;
}

// Init State ==================================================================

/// The initial state of the session state machine, where the channel to the
/// device is opened.
///
///  * **[`SynchronizeEvent`] => [`SynchronizeState`]** once the channel is
///    open,
///  * **[`DoneEvent`] => [`DoneState`]** when the device could not be opened.
///    Nothing is sent to the device in that case.
#[derive(Debug)]
pub(crate) struct InitState {}
impl Runnable for InitState {
    fn run(&mut self, context: &mut Context) -> Event {
        info!("=> Init");
        match context.connector.connect(&context.settings) {
            Ok(channel) => Event::Synchronize(SynchronizeEvent { channel }),
            Err(e) => Event::Done(DoneEvent { outcome: Err(e) }),
        }
    }
}

// Synchronize State ===========================================================

/// The state where the remote shell is probed with `echo` until it answers
/// with the session's token.
///
///  * **[`DumpEvent`] => [`DumpState`]** once the token was echoed,
///  * **[`DoneEvent`] => [`DoneState`]** when the retries are exhausted.
pub(crate) struct SynchronizeState {
    /// Consumed and moved upon the transition to [`DumpState`].
    pub channel: Option<Box<dyn Channel>>,
}
impl Runnable for SynchronizeState {
    fn run(&mut self, context: &mut Context) -> Event {
        info!("=> Synchronize");

        if let Some(mut channel) = self.channel.take() {
            let result = synchronize(
                channel.as_mut(),
                &context.token,
                context.settings.sync_retries,
                context.progress.as_mut(),
            );
            return match result {
                Ok(_) => Event::Dump(DumpEvent { channel }),
                Err(e) => Event::Done(DoneEvent { outcome: Err(e) }),
            };
        }

        // We should never reach here!
        unreachable!()
    }
}
impl fmt::Debug for SynchronizeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SynchronizeState")
            .field(&self.channel.is_some())
            .finish()
    }
}

// Dump State ==================================================================

/// The state where `md.b` is run and its output written to the output file.
///
/// The output file only lives for the duration of this state: it is closed
/// when the state is left, whether the dump succeeded or not.
///
///  * **[`DoneEvent`] => [`DoneState`]** in all cases, carrying the outcome.
pub(crate) struct DumpState {
    /// The synchronized channel.
    pub channel: Option<Box<dyn Channel>>,
}
impl Runnable for DumpState {
    fn run(&mut self, context: &mut Context) -> Event {
        info!("=> Dump");

        if let Some(mut channel) = self.channel.take() {
            let outcome = dump_to_file(channel.as_mut(), &context.job, context.progress.as_mut());
            return Event::Done(DoneEvent { outcome });
        }

        // We should never reach here!
        unreachable!()
    }
}
impl fmt::Debug for DumpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DumpState")
            .field(&self.channel.is_some())
            .finish()
    }
}

// Done State ==================================================================

/// Reached when the session completes its execution and is about to terminate
/// (normally or abnormally).
///
/// This state goes into a 2-phase execution. During the initial phase, it
/// reports the error if any. It then triggers the [`ExitEvent`] to cause the
/// state machine to terminate with the exit code of the outcome.
#[derive(Debug)]
pub(crate) struct DoneState {
    /// Why the session is ending early, if it is.
    pub error: Option<Error>,
    /// The exit status of the session; `0` on success.
    pub exit_code: i32,
    /// When `true` instructs the state machine to exit its event loop.
    pub should_exit: bool,
}
impl Runnable for DoneState {
    fn run(&mut self, context: &mut Context) -> Event {
        info!(
            "=> Done with{}errors",
            if self.error.is_some() { " " } else { " no " }
        );
        if let Some(e) = &self.error {
            error!("{}", e);
            context.progress.failed(e);
        }

        Event::Exit(ExitEvent {
            exit_code: self.exit_code,
        })
    }
}

// =============================================================================
// Private stuff
// =============================================================================

fn dump_to_file(channel: &mut dyn Channel, job: &DumpJob, progress: &mut dyn Progress) -> Result<()> {
    let file = File::create(&job.outfile)?;
    let mut sink = BufWriter::new(file);

    run_dump(channel, &job.request, &mut sink, progress)?;
    sink.flush()?;

    progress.dump_finished(&job.outfile.display().to_string());
    Ok(())
}
