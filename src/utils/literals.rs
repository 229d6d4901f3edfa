//! Parsing of the numeric values given on the command line.

use std::num::ParseIntError;

/// Parse a start address, always hexadecimal. The `0x` prefix and `_`
/// separators are accepted (`0x8000_0000`, `80000000`).
pub fn parse_address(value: &str) -> Result<u64, ParseIntError> {
    let value = value.trim().replace('_', "");
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(&value);
    u64::from_str_radix(digits, 16)
}

/// Parse a byte count following integer literal rules: `0x`/`0o`/`0b`
/// prefixes select the radix, anything else is decimal. A decimal value may
/// not start with `0` unless it is zero.
pub fn parse_size(value: &str) -> Result<u64, ParseIntError> {
    let value = value.trim().replace('_', "");
    let lower = value.to_ascii_lowercase();
    if let Some(digits) = lower.strip_prefix("0x") {
        u64::from_str_radix(digits, 16)
    } else if let Some(digits) = lower.strip_prefix("0o") {
        u64::from_str_radix(digits, 8)
    } else if let Some(digits) = lower.strip_prefix("0b") {
        u64::from_str_radix(digits, 2)
    } else if lower.len() > 1 && lower.starts_with('0') && lower.bytes().any(|b| b != b'0') {
        // Not an octal literal; feed the parser a non-digit so it fails
        "-".parse()
    } else {
        lower.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_with_and_without_prefix() {
        assert_eq!(parse_address("0x1000"), Ok(0x1000));
        assert_eq!(parse_address("1000"), Ok(0x1000));
        assert_eq!(parse_address("0X9F00_0000"), Ok(0x9f00_0000));
        assert_eq!(parse_address("deadBEEF"), Ok(0xdead_beef));
    }

    #[test]
    fn address_rejects_garbage() {
        assert!(parse_address("").is_err());
        assert!(parse_address("0x").is_err());
        assert!(parse_address("0x10g").is_err());
    }

    #[test]
    fn size_literals() {
        assert_eq!(parse_size("32"), Ok(32));
        assert_eq!(parse_size("0x20"), Ok(32));
        assert_eq!(parse_size("0o40"), Ok(32));
        assert_eq!(parse_size("0b100000"), Ok(32));
        assert_eq!(parse_size("1_048_576"), Ok(1 << 20));
        assert_eq!(parse_size("0"), Ok(0));
        assert_eq!(parse_size("000"), Ok(0));
    }

    #[test]
    fn size_rejects_garbage() {
        assert!(parse_size("twenty").is_err());
        assert!(parse_size("-1").is_err());
        assert!(parse_size("0x").is_err());
        assert!(parse_size("010").is_err());
        assert!(parse_size("0_10").is_err());
    }
}
