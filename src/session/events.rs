//! Events for the `ubdump` session state machine.
//!
//! This modules is private and restricted to the [`session`](crate::session)
//! scope. The public interface of the state machine is provided by
//! [`session`](crate::session).
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use std::fmt;

use crate::{channel::Channel, error::Result};

// =============================================================================
// Crate-Public Interface
// =============================================================================

// SynchronizeEvent ============================================================

/// Event fired to trigger a transition to the `Synchronize` state, once the
/// channel to the device has been opened.
pub(crate) struct SynchronizeEvent {
    /// The channel to be used in the next state. Consumed and moved to the
    /// next state.
    pub channel: Box<dyn Channel>,
}
impl fmt::Debug for SynchronizeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SynchronizeEvent").finish()
    }
}

// DumpEvent ===================================================================

/// Event fired to trigger a transition to the `Dump` state, once the shell
/// echoed the synchronization token.
pub(crate) struct DumpEvent {
    /// The synchronized channel. Consumed and moved to the next state.
    pub channel: Box<dyn Channel>,
}
impl fmt::Debug for DumpEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DumpEvent").finish()
    }
}

// DoneEvent ===================================================================

/// Event fired when the session is finished, successfully or not. It triggers
/// a transition to the `Done` state.
///
/// This event can happen at any state: after the dump completed, or as soon as
/// any step fails since none of the failures are recoverable within a session.
#[derive(Debug)]
pub(crate) struct DoneEvent {
    pub outcome: Result<()>,
}

// ExitEvent ===================================================================

/// The last event of the session state machine. It results in the event loop
/// terminating with `exit_code`, handing back the control to the caller.
#[derive(Debug)]
pub(crate) struct ExitEvent {
    pub exit_code: i32,
}

// Events enum ==================================================================

/// Events that can be triggered within the session state machine.
///
/// Each possible value holds an `event`, which in turn may hold additional data
/// for the state transition. Such data is passed by the origin state for
/// potential use by the target state.
#[derive(Debug)]
pub(crate) enum Event {
    Synchronize(SynchronizeEvent),
    Dump(DumpEvent),
    Done(DoneEvent),
    Exit(ExitEvent),
}
