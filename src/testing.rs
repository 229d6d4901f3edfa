//! In-memory doubles shared by the unit tests.

use std::{collections::VecDeque, io};

use crate::{channel::Channel, dump::DumpRequest, progress::Progress};

/// A channel replaying a fixed script of reads. Once the script is exhausted
/// every read times out.
#[derive(Debug, Default)]
pub(crate) struct ScriptedChannel {
    pub sent: Vec<String>,
    replies: VecDeque<Option<String>>,
}
impl ScriptedChannel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        ScriptedChannel {
            sent: vec![],
            replies: replies.into_iter().map(|r| r.map(Into::into)).collect(),
        }
    }

    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(lines.into_iter().map(Some))
    }

    pub fn remaining(&self) -> usize {
        self.replies.len()
    }
}
impl Channel for ScriptedChannel {
    fn send(&mut self, command: &str) -> io::Result<()> {
        self.sent.push(command.to_owned());
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.replies.pop_front().flatten())
    }
}

/// Records every progress notification.
#[derive(Debug, Default)]
pub(crate) struct RecordingProgress {
    pub failed_attempts: Vec<u32>,
    pub synchronized: Option<u32>,
    pub started: Option<DumpRequest>,
    pub totals: Vec<u64>,
}
impl Progress for RecordingProgress {
    fn sync_attempt_failed(&mut self, attempt: u32) {
        self.failed_attempts.push(attempt);
    }
    fn synchronized(&mut self, attempts: u32) {
        self.synchronized = Some(attempts);
    }
    fn dump_started(&mut self, request: &DumpRequest) {
        self.started = Some(*request);
    }
    fn bytes_read(&mut self, total: u64) {
        self.totals.push(total);
    }
}

/// Render `data` the way `md.b` prints it when asked for `data.len()` bytes
/// at `address`, ASCII column included.
pub(crate) fn md_output(address: u64, data: &[u8]) -> Vec<String> {
    data.chunks(16)
        .enumerate()
        .map(|(index, chunk)| {
            let mut line = format!("{:08x}:", address + (index as u64) * 16);
            for byte in chunk {
                line.push_str(&format!(" {:02x}", byte));
            }
            line.push_str(&"   ".repeat(16 - chunk.len()));
            line.push_str("    ");
            for byte in chunk {
                let c = *byte as char;
                line.push(if c.is_ascii_graphic() { c } else { '.' });
            }
            line.push_str("\r\n");
            line
        })
        .collect()
}
