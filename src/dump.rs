//! Reading memory or flash contents through the `md.b` command.
//!
//! The dump is streamed: every line is validated and its bytes written to the
//! sink before the next line is read. A line that does not parse, or that does
//! not start where the previous one ended, aborts the whole dump. There is no
//! retry of individual lines since either means the link is no longer in step
//! with the shell.

use std::io::Write;

use hexplay::HexViewBuilder;
use log::{debug, log_enabled, trace, Level::Trace};

use crate::{
    channel::Channel,
    error::{Error, Result},
    hexline::LineParser,
    progress::Progress,
};

// =============================================================================
// Public Interface
// =============================================================================

/// The range of device memory to retrieve.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DumpRequest {
    /// Absolute start address.
    pub address: u64,
    /// Number of bytes to read.
    pub size: u64,
}
impl DumpRequest {
    pub fn new(address: u64, size: u64) -> Self {
        DumpRequest { address, size }
    }

    /// Whether the whole range fits in the 8 digit address column of the
    /// `md.b` output.
    pub fn is_addressable(&self) -> bool {
        const ADDRESS_SPACE: u64 = 1 << 32;
        self.address < ADDRESS_SPACE
            && self
                .address
                .checked_add(self.size)
                .map_or(false, |end| end <= ADDRESS_SPACE)
    }

    /// The shell command producing the dump.
    pub fn command(&self) -> String {
        format!("md.b {:x} {:x}\n", self.address, self.size)
    }
}

/// The cursor of a dump in progress.
///
/// `expected_address - start == bytes_written` after every accepted line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DumpProgress {
    pub start: u64,
    pub expected_address: u64,
    pub bytes_written: u64,
}
impl DumpProgress {
    fn new(request: &DumpRequest) -> Self {
        DumpProgress {
            start: request.address,
            expected_address: request.address,
            bytes_written: 0,
        }
    }

    fn advance(&mut self, count: u64) {
        self.expected_address += count;
        self.bytes_written += count;
    }
}

/// Run `md.b` for `request` over an already synchronized `channel`, writing
/// the bytes to `sink` in address order.
///
/// The first line after the command is the shell's echo of it and is dropped
/// without looking at it. Reading stops once `request.size` bytes have been
/// written; a last line carrying more than that is cut so the sink receives
/// exactly `request.size` bytes.
pub fn run_dump<C, W>(
    channel: &mut C,
    request: &DumpRequest,
    sink: &mut W,
    progress: &mut dyn Progress,
) -> Result<DumpProgress>
where
    C: Channel + ?Sized,
    W: Write + ?Sized,
{
    let parser = LineParser::new();
    let mut cursor = DumpProgress::new(request);

    progress.dump_started(request);
    channel.send(&request.command())?;
    let echo = channel.read_line()?;
    trace!("command echo: {:?}", echo);

    while cursor.bytes_written < request.size {
        let raw = channel.read_line()?.ok_or(Error::ReadTimeout {
            expected_address: cursor.expected_address,
            bytes_written: cursor.bytes_written,
        })?;

        let line = parser.parse(&raw)?;
        if line.address != cursor.expected_address {
            return Err(Error::AddressMismatch {
                expected: cursor.expected_address,
                received: line.address,
            });
        }

        let remaining = request.size - cursor.bytes_written;
        let take = std::cmp::min(line.data.len() as u64, remaining) as usize;
        let data = &line.data[..take];

        if log_enabled!(Trace) {
            let view = HexViewBuilder::new(data)
                .address_offset(line.address as usize)
                .row_width(16)
                .finish();
            trace!("\n{}", view);
        }

        sink.write_all(data)?;
        cursor.advance(take as u64);
        progress.bytes_read(cursor.bytes_written);
    }

    debug!(
        "Dump complete: {} bytes, next address {:#010x}",
        cursor.bytes_written, cursor.expected_address
    );
    Ok(cursor)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Silent;
    use crate::testing::{md_output, RecordingProgress, ScriptedChannel};

    fn channel_for(request: &DumpRequest, data: &[u8]) -> ScriptedChannel {
        let mut lines = vec![format!("=> {}", request.command().trim_end())];
        lines.extend(md_output(request.address, data));
        lines.push("=> ".into());
        ScriptedChannel::lines(lines)
    }

    #[test]
    fn command_is_lowercase_hex_without_prefix() {
        let request = DumpRequest::new(0x9F00_0000, 1024);
        assert_eq!(request.command(), "md.b 9f000000 400\n");
    }

    #[test]
    fn addressable_ranges() {
        assert!(DumpRequest::new(0, 0).is_addressable());
        assert!(DumpRequest::new(0x9f00_0000, 0x100_0000).is_addressable());
        assert!(DumpRequest::new(0xffff_fff0, 16).is_addressable());
        assert!(DumpRequest::new(0xffff_ffff, 0).is_addressable());

        assert!(!DumpRequest::new(0xffff_fff0, 17).is_addressable());
        assert!(!DumpRequest::new(0x1_0000_0000, 0).is_addressable());
        assert!(!DumpRequest::new(0x1_0000_0000, 16).is_addressable());
        assert!(!DumpRequest::new(u64::MAX, u64::MAX).is_addressable());
    }

    #[test]
    fn two_full_lines() {
        let request = DumpRequest::new(0x1000, 32);
        let mut channel = ScriptedChannel::lines(vec![
            "=> md.b 1000 20\r\n",
            "00001000: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f    ................\r\n",
            "00001010: 10 11 12 13 14 15 16 17 18 19 1a 1b 1c 1d 1e 1f    ................\r\n",
        ]);
        let mut sink = Vec::new();
        let mut progress = RecordingProgress::default();

        let cursor = run_dump(&mut channel, &request, &mut sink, &mut progress).unwrap();

        assert_eq!(sink, (0u8..32).collect::<Vec<_>>());
        assert_eq!(cursor.expected_address, 0x1020);
        assert_eq!(cursor.bytes_written, 32);
        assert_eq!(channel.sent, vec!["md.b 1000 20\n"]);
        assert_eq!(progress.started, Some(request));
        assert_eq!(progress.totals, vec![16, 32]);
    }

    #[test]
    fn contiguous_dump_reproduces_buffer() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i * 7 + 3) as u8).collect();
        let request = DumpRequest::new(0x8000_0000, data.len() as u64);
        let mut channel = channel_for(&request, &data);
        let mut sink = Vec::new();

        let cursor = run_dump(&mut channel, &request, &mut sink, &mut Silent).unwrap();

        assert_eq!(sink, data);
        assert_eq!(cursor.expected_address, 0x8000_0000 + 1000);
        assert_eq!(cursor.expected_address - cursor.start, cursor.bytes_written);
        // The trailing prompt is not consumed
        assert_eq!(channel.remaining(), 1);
    }

    #[test]
    fn zero_size_reads_only_the_echo() {
        let request = DumpRequest::new(0x1000, 0);
        let mut channel = ScriptedChannel::lines(vec!["=> md.b 1000 0\r\n", "=> "]);
        let mut sink = Vec::new();

        let cursor = run_dump(&mut channel, &request, &mut sink, &mut Silent).unwrap();

        assert!(sink.is_empty());
        assert_eq!(cursor.bytes_written, 0);
        assert_eq!(channel.remaining(), 1);
    }

    #[test]
    fn echo_is_discarded_without_validation() {
        let request = DumpRequest::new(0, 4);
        let mut channel =
            ScriptedChannel::lines(vec!["not-a-valid-line\r\n", "00000000: 01 02 03 04\r\n"]);
        let mut sink = Vec::new();

        run_dump(&mut channel, &request, &mut sink, &mut Silent).unwrap();

        assert_eq!(sink, vec![1, 2, 3, 4]);
    }

    #[test]
    fn malformed_line_aborts() {
        let request = DumpRequest::new(0x1000, 48);
        let mut channel = ScriptedChannel::lines(vec![
            "=> md.b 1000 30\r\n",
            "00001000: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f\r\n",
            "not-a-valid-line\r\n",
            "00001010: 10 11 12 13 14 15 16 17 18 19 1a 1b 1c 1d 1e 1f\r\n",
        ]);
        let mut sink = Vec::new();

        let result = run_dump(&mut channel, &request, &mut sink, &mut Silent);

        match result {
            Err(Error::MalformedLine { line }) => assert_eq!(line, "not-a-valid-line"),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(sink, (0u8..16).collect::<Vec<_>>());
        assert_eq!(channel.remaining(), 1);
    }

    #[test]
    fn skipped_line_is_an_address_mismatch() {
        let request = DumpRequest::new(0x1000, 48);
        let mut channel = ScriptedChannel::lines(vec![
            "=> md.b 1000 30\r\n",
            "00001000: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f\r\n",
            "00001020: 20 21 22 23 24 25 26 27 28 29 2a 2b 2c 2d 2e 2f\r\n",
        ]);
        let mut sink = Vec::new();

        let result = run_dump(&mut channel, &request, &mut sink, &mut Silent);

        match result {
            Err(Error::AddressMismatch { expected, received }) => {
                assert_eq!(expected, 0x1010);
                assert_eq!(received, 0x1020);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(sink.len(), 16);
    }

    #[test]
    fn timeout_mid_dump_aborts() {
        let request = DumpRequest::new(0x1000, 32);
        let mut channel = ScriptedChannel::new(vec![
            Some("=> md.b 1000 20\r\n"),
            Some("00001000: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f\r\n"),
            None,
            Some("00001010: 10 11 12 13 14 15 16 17 18 19 1a 1b 1c 1d 1e 1f\r\n"),
        ]);
        let mut sink = Vec::new();

        let result = run_dump(&mut channel, &request, &mut sink, &mut Silent);

        match result {
            Err(Error::ReadTimeout {
                expected_address,
                bytes_written,
            }) => {
                assert_eq!(expected_address, 0x1010);
                assert_eq!(bytes_written, 16);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn oversized_last_line_is_cut_to_request() {
        let request = DumpRequest::new(0x1000, 20);
        let data: Vec<u8> = (0u8..32).collect();
        let mut channel = channel_for(&request, &data);
        let mut sink = Vec::new();

        let cursor = run_dump(&mut channel, &request, &mut sink, &mut Silent).unwrap();

        assert_eq!(sink, (0u8..20).collect::<Vec<_>>());
        assert_eq!(cursor.bytes_written, 20);
        assert_eq!(cursor.expected_address, 0x1014);
    }

    #[test]
    fn unaligned_start_and_short_lines() {
        // Some shells start at the requested address and print a short last
        // line; only contiguity matters.
        let request = DumpRequest::new(0x1004, 20);
        let mut channel = ScriptedChannel::lines(vec![
            "=> md.b 1004 14\r\n",
            "00001004: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f    ................\r\n",
            "00001014: 10 11 12 13                                        ....\r\n",
        ]);
        let mut sink = Vec::new();

        let cursor = run_dump(&mut channel, &request, &mut sink, &mut Silent).unwrap();

        assert_eq!(sink, (0u8..20).collect::<Vec<_>>());
        assert_eq!(cursor.expected_address, 0x1018);
    }
}
