//! Synchronization with the bootloader shell.
//!
//! When `ubdump` opens the port, the shell may be in the middle of printing
//! something, may have stale output buffered, or may not be listening yet.
//! Before any command output can be trusted, the shell is asked to `echo` a
//! token nobody else would print, and lines are read until that token comes
//! back on its own line. The echo of the command line itself (`=> echo ...`)
//! never matches because the comparison is on the whole trimmed line.

use std::fmt;

use log::{debug, info, trace};
use rand::Rng;

use crate::{
    channel::Channel,
    error::{Error, Result},
    progress::Progress,
};

// =============================================================================
// Public Interface
// =============================================================================

/// The sentinel echoed by the shell to prove the link is in step.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SyncToken(String);
impl SyncToken {
    /// A token unique to this run, so that output left over from a previous
    /// run cannot be mistaken for our echo.
    pub fn random() -> Self {
        let nonce: u64 = rand::thread_rng().gen();
        SyncToken(format!("----sync-{:016x}----", nonce))
    }

    pub fn fixed(token: impl Into<String>) -> Self {
        SyncToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The shell command asking for the token to be echoed.
    pub fn probe(&self) -> String {
        format!("echo {}\n", self.0)
    }
}
impl fmt::Display for SyncToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bring `channel` in step with the remote shell, sending at most
/// `max_retries` probes.
///
/// Returns the number of probes it took. Each probe is followed by reads until
/// either the token comes back (success) or a read returns nothing, in which
/// case the attempt is abandoned and a fresh probe is sent.
pub fn synchronize<C: Channel + ?Sized>(
    channel: &mut C,
    token: &SyncToken,
    max_retries: u32,
    progress: &mut dyn Progress,
) -> Result<u32> {
    info!("Synchronizing with token {}", token);
    progress.sync_started();

    let mut state = SyncState::new(max_retries);
    while state.retries_left > 0 {
        let attempt = state.attempt();
        channel.send(&token.probe())?;

        while let Some(line) = channel.read_line()? {
            if line.trim() == token.as_str() {
                debug!("Synchronized after {} attempt(s)", attempt);
                progress.synchronized(attempt);
                return Ok(attempt);
            }
            trace!("skipping {:?}", line);
        }

        debug!("No echo for attempt {}", attempt);
        state.retries_left -= 1;
        progress.sync_attempt_failed(attempt);
    }

    Err(Error::SyncTimeout {
        attempts: max_retries,
    })
}

// =============================================================================
// Private stuff
// =============================================================================

/// The retry budget of one `synchronize` call.
#[derive(Debug)]
struct SyncState {
    max_retries: u32,
    retries_left: u32,
}
impl SyncState {
    fn new(max_retries: u32) -> Self {
        SyncState {
            max_retries,
            retries_left: max_retries,
        }
    }

    /// 1-based number of the attempt about to be made.
    fn attempt(&self) -> u32 {
        self.max_retries - self.retries_left + 1
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
