//! The line format of the `md.b` output.
//!
//! ```text
//! 00001000: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f    ................
//! ```
//!
//! An 8 digit hex address, a colon, then up to 16 space-prefixed hex bytes.
//! What follows the bytes (the ASCII column, line terminator) is ignored.

use regex::Regex;

use crate::error::{Error, Result};

/// A successfully parsed line of dump output.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HexLine {
    pub address: u64,
    pub data: Vec<u8>,
}

/// Parser for [`HexLine`]s, holding the compiled line pattern.
#[derive(Debug, Clone)]
pub struct LineParser {
    pattern: Regex,
}
impl LineParser {
    pub fn new() -> Self {
        let pattern = Regex::new(r"^(?P<addr>[0-9a-fA-F]{8}):(?P<data>(?: [0-9a-fA-F]{2}){0,16})")
            .expect("hex dump line pattern is valid");
        LineParser { pattern }
    }

    pub fn parse(&self, line: &str) -> Result<HexLine> {
        let malformed = || Error::MalformedLine {
            line: line.trim().to_owned(),
        };

        let captures = self.pattern.captures(line).ok_or_else(malformed)?;
        let address = u64::from_str_radix(&captures["addr"], 16).map_err(|_| malformed())?;
        let digits: String = captures["data"].split_whitespace().collect();
        let data = hex::decode(digits).map_err(|_| malformed())?;

        Ok(HexLine { address, data })
    }
}
impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}
