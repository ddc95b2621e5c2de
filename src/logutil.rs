//! Logging helpers for binary payloads: bounded hex previews for log lines and
//! parsing of hex captures pasted from logs or reader tools.
use std::fmt::Write;

use anyhow::{anyhow, Result};

/// Uppercase hex of at most `max` leading bytes, with an ellipsis when cut.
pub fn hex_snippet(data: &[u8], max: usize) -> String {
    let shown = &data[..data.len().min(max)];
    let mut out = String::with_capacity(shown.len() * 2 + 3);
    for b in shown {
        let _ = write!(&mut out, "{:02X}", b);
    }
    if data.len() > max {
        out.push('…');
    }
    out
}

/// Parse a hex capture, ignoring whitespace, `:`/`-` separators and `0x` prefixes.
pub fn parse_hex_capture(text: &str) -> Result<Vec<u8>> {
    let cleaned: String = text
        .split(|c: char| c.is_whitespace() || c == ':' || c == '-' || c == ',')
        .map(|tok| tok.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();
    hex::decode(&cleaned).map_err(|e| anyhow!("invalid hex capture: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_truncates_with_ellipsis() {
        assert_eq!(hex_snippet(&[0xCF, 0x0A, 0xFF], 8), "CF0AFF");
        assert_eq!(hex_snippet(&[0xCF, 0x0A, 0xFF], 2), "CF0A…");
        assert_eq!(hex_snippet(&[], 4), "");
    }

    #[test]
    fn parses_common_capture_formats() {
        assert_eq!(parse_hex_capture("CF FF 00").unwrap(), vec![0xCF, 0xFF, 0x00]);
        assert_eq!(parse_hex_capture("cf:ff\n00").unwrap(), vec![0xCF, 0xFF, 0x00]);
        assert_eq!(parse_hex_capture("0xCF, 0x01").unwrap(), vec![0xCF, 0x01]);
        assert!(parse_hex_capture("CFF").is_err());
        assert!(parse_hex_capture("ZZ").is_err());
    }
}
