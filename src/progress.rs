//! User feedback while synchronizing and dumping.
//!
//! The protocol code reports what it is doing through the [`Progress`] trait
//! and never writes to the terminal itself. [`ConsoleProgress`] is what the
//! command line uses; [`Silent`] discards everything.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{dump::DumpRequest, error::Error};

// =============================================================================
// Public Interface
// =============================================================================

/// Hooks called by the synchronizer and the dump reader. All of them default
/// to doing nothing.
pub trait Progress {
    /// The synchronization handshake is starting.
    fn sync_started(&mut self) {}
    /// The `attempt`-th probe got no matching echo.
    fn sync_attempt_failed(&mut self, _attempt: u32) {}
    /// The shell echoed the token back on the `attempts`-th probe.
    fn synchronized(&mut self, _attempts: u32) {}
    /// The dump command is about to be sent.
    fn dump_started(&mut self, _request: &DumpRequest) {}
    /// `total` bytes have been written to the output so far.
    fn bytes_read(&mut self, _total: u64) {}
    /// The dump completed and was written to `destination`.
    fn dump_finished(&mut self, _destination: &str) {}
    /// The session is ending because of `error`.
    fn failed(&mut self, _error: &Error) {}
}

/// Reports nothing.
#[derive(Debug, Default, Copy, Clone)]
pub struct Silent;
impl Progress for Silent {}

/// Reports progress on the terminal with a spinner while synchronizing and a
/// progress bar while dumping.
#[derive(Default)]
pub struct ConsoleProgress {
    bar: Option<ProgressBar>,
}
impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }
}
impl Progress for ConsoleProgress {
    fn sync_started(&mut self) {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(120);
        pb.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓"])
                .template("[UB] {spinner:.blue} {msg}"),
        );
        pb.set_message("Synchronizing serial interface...");
        self.bar = Some(pb);
    }

    fn sync_attempt_failed(&mut self, attempt: u32) {
        if let Some(pb) = &self.bar {
            pb.set_message(format!(
                "Synchronizing serial interface... {}",
                style("+".repeat(attempt as usize)).yellow()
            ));
        }
    }

    fn synchronized(&mut self, attempts: u32) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message(format!(
                "👍 Synchronized after {} attempt(s)",
                style(attempts).green()
            ));
        }
    }

    fn dump_started(&mut self, request: &DumpRequest) {
        println!(
            "[UB] Dumping {} bytes starting at {}",
            style(request.size).cyan(),
            style(format!("{:#x}", request.address)).cyan()
        );
        let pb = ProgressBar::new(request.size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "[UB] ⏬ Reading [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                )
                .progress_chars("=>-"),
        );
        self.bar = Some(pb);
    }

    fn bytes_read(&mut self, total: u64) {
        if let Some(pb) = &self.bar {
            pb.set_position(total);
        }
    }

    fn dump_finished(&mut self, destination: &str) {
        if let Some(pb) = self.bar.take() {
            pb.finish();
        }
        println!("[UB] Finished writing {}", style(destination).green());
    }

    fn failed(&mut self, error: &Error) {
        if let Some(pb) = self.bar.take() {
            pb.abandon();
        }
        println!("{} {}", style("[UB] 💥 error:").red(), error);
    }
}
