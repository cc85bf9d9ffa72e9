// usbtime - core/parser.rs
//
// Line-oriented parsing of kernel log text into USB records.
// Core layer: accepts strings, never touches the filesystem directly.

use crate::core::model::ParsedRecord;
use crate::util::error::ParseError;
use regex::Regex;
use std::sync::OnceLock;

/// Matches `[  12.345678] usb 1-1.2: usb <message>`.
///
/// The device token is ASCII digits joined by `-` and `.`, optionally
/// prefixed by `usb` (root hubs log as `usb1`). Leading whitespace inside
/// the brackets is optional; dmesg pads short timestamps but not long ones.
/// `[0-9]` rather than `\d`, which would also match non-ASCII digits.
const USB_LINE_PATTERN: &str = r"\[\s*(?P<timestamp>[0-9]+\.[0-9]+)\] usb (?P<device>(?:usb)*[0-9]+(?:[-.][0-9]+)*): usb (?P<message>.+)";

fn usb_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The pattern is a constant covered by the unit tests below.
    RE.get_or_init(|| Regex::new(USB_LINE_PATTERN).expect("USB_LINE_PATTERN is a valid regex"))
}

/// Result of parsing a whole log buffer.
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Matching records in input order.
    pub records: Vec<ParsedRecord>,
    /// Total lines processed.
    pub lines_processed: u64,
    /// Lines that did not match the USB pattern.
    pub lines_skipped: u64,
}

/// Parse one kernel log line.
///
/// Returns `Ok(None)` for any line that is not a `usb` device message; that
/// is the common case and not an error. `line_number` is only used for
/// error context.
pub fn parse_line(line: &str, line_number: u64) -> Result<Option<ParsedRecord>, ParseError> {
    let Some(caps) = usb_line_regex().captures(line) else {
        return Ok(None);
    };

    // All three groups are mandatory in the pattern.
    let timestamp = parse_timestamp(&caps["timestamp"], line_number)?;

    Ok(Some(ParsedRecord {
        device_id: caps["device"].to_string(),
        message: caps["message"].to_string(),
        timestamp,
    }))
}

/// Kernel timestamp text to seconds.
fn parse_timestamp(raw: &str, line_number: u64) -> Result<f64, ParseError> {
    raw.parse::<f64>()
        .map_err(|source| ParseError::TimestampParse {
            line_number,
            raw_timestamp: raw.to_string(),
            source,
        })
}

/// Parse a whole log buffer, keeping records in line order.
///
/// Stops at the first malformed timestamp.
pub fn parse_content(content: &str) -> Result<ParseResult, ParseError> {
    let mut result = ParseResult::default();

    for (line_idx, line) in content.lines().enumerate() {
        result.lines_processed += 1;
        match parse_line(line, (line_idx as u64) + 1)? {
            Some(record) => result.records.push(record),
            None => result.lines_skipped += 1,
        }
    }

    tracing::debug!(
        lines = result.lines_processed,
        records = result.records.len(),
        skipped = result.lines_skipped,
        "Parsing complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_basic_line() {
        let rec = parse_line("[  123.456] usb 1-1: usb device begin enumeration", 1)
            .unwrap()
            .expect("line should match");
        assert_eq!(rec.device_id, "1-1");
        assert_eq!(rec.message, "device begin enumeration");
        assert_eq!(rec.timestamp, 123.456);
    }

    #[test]
    fn test_parse_nested_port_path() {
        let rec = parse_line("[    5.100200] usb 2-1.3: usb reset end", 1)
            .unwrap()
            .unwrap();
        assert_eq!(rec.device_id, "2-1.3");
        assert_eq!(rec.message, "reset end");
    }

    #[test]
    fn test_parse_root_hub_id() {
        let rec = parse_line("[    0.900000] usb usb3: usb hub suspend begin", 1)
            .unwrap()
            .unwrap();
        assert_eq!(rec.device_id, "usb3");
        assert_eq!(rec.timestamp, 0.9);
    }

    #[test]
    fn test_parse_unpadded_timestamp() {
        let rec = parse_line("[12345.678901] usb 1-2: usb resume begin", 1)
            .unwrap()
            .unwrap();
        assert_eq!(rec.device_id, "1-2");
        assert_eq!(rec.timestamp, 12345.678901);
    }

    #[test]
    fn test_parse_with_syslog_prefix() {
        let line = "Jan 15 14:30:22 host kernel: [    1.000000] usb 1-1: usb reset begin";
        let rec = parse_line(line, 1).unwrap().unwrap();
        assert_eq!(rec.device_id, "1-1");
        assert_eq!(rec.message, "reset begin");
    }

    #[test]
    fn test_non_usb_lines_skipped() {
        for line in [
            "",
            "[    0.000000] Linux version 6.1.0",
            "[    1.234567] usb 1-1: new high-speed USB device number 2 using xhci_hcd",
            "[    1.234567] usbcore: registered new interface driver usbfs",
            "[    1.234567] usb 1-1 usb reset begin",
            "[1] usb 1-1: usb reset begin",
        ] {
            assert_eq!(parse_line(line, 1).unwrap(), None, "line: {line:?}");
        }
    }

    #[test]
    fn test_non_ascii_digits_skipped() {
        // Arabic-Indic digits in the timestamp, then in the device id.
        assert_eq!(parse_line("[ ١.٥] usb 1-1: usb reset begin", 1).unwrap(), None);
        assert_eq!(parse_line("[ 1.5] usb ١-١: usb reset begin", 1).unwrap(), None);
    }

    #[test]
    fn test_malformed_timestamp_is_error() {
        let err = parse_timestamp("1.2.3", 4).unwrap_err();
        assert!(
            matches!(err, ParseError::TimestampParse { line_number: 4, ref raw_timestamp, .. }
                if raw_timestamp == "1.2.3"),
            "got {err:?}"
        );
        assert_eq!(parse_timestamp("0012.500", 1).unwrap(), 12.5);
    }

    #[test]
    fn test_parse_content_counts_and_order() {
        let content = "[    1.000000] usb 1-1: usb reset begin\n\
                       [    1.100000] xhci_hcd 0000:00:14.0: hello\n\
                       [    2.500000] usb 1-1: usb reset end\n";
        let result = parse_content(content).unwrap();
        assert_eq!(result.lines_processed, 3);
        assert_eq!(result.lines_skipped, 1);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].timestamp, 1.0);
        assert_eq!(result.records[1].timestamp, 2.5);
    }

    #[test]
    fn test_parse_content_crlf() {
        let result = parse_content("[ 1.5] usb 1-1: usb reset begin\r\n").unwrap();
        assert_eq!(result.records[0].message, "reset begin");
    }

    #[test]
    fn test_parse_empty_content() {
        let result = parse_content("").unwrap();
        assert_eq!(result.lines_processed, 0);
        assert!(result.records.is_empty());
    }

    proptest! {
        #[test]
        fn prop_lines_without_usb_marker_never_match(line in "[^\\[]*") {
            prop_assert_eq!(parse_line(&line, 1).unwrap(), None);
        }

        #[test]
        fn prop_arbitrary_text_never_errors(line in "\\PC*") {
            prop_assert!(parse_line(&line, 1).is_ok());
        }

        #[test]
        fn prop_well_formed_lines_round_trip_fields(
            secs in 0u32..100_000,
            micros in 0u32..1_000_000,
            bus in 1u8..10,
            port in 1u8..16,
            msg in "[a-z][a-z ]{0,30}",
        ) {
            let line = format!("[{secs:>5}.{micros:06}] usb {bus}-{port}: usb {msg}");
            let rec = parse_line(&line, 1).unwrap().unwrap();
            prop_assert_eq!(rec.device_id, format!("{bus}-{port}"));
            prop_assert_eq!(rec.message, msg);
            let expected: f64 = format!("{secs}.{micros:06}").parse().unwrap();
            prop_assert_eq!(rec.timestamp, expected);
        }
    }
}
