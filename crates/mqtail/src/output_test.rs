//! Tests for the message formatter

use super::*;
use bytes::Bytes;
use mqtail_config::ColorMode;

fn msg(topic: &str, payload: &[u8], qos: u8, retain: bool) -> MessageEvent {
    MessageEvent {
        topic: topic.to_string(),
        payload: Bytes::copy_from_slice(payload),
        qos,
        retain,
    }
}

fn formatter(format: FormatMode) -> Formatter {
    let opts = OutputOptions {
        format,
        timestamp: TimestampMode::None,
        color: ColorMode::Never,
        ..OutputOptions::default()
    };
    Formatter::new(&opts).with_color(false)
}

// =============================================================================
// Text Mode
// =============================================================================

#[test]
fn test_text_plain_payload() {
    let f = formatter(FormatMode::Text);
    let line = f.format_message(&msg("sensors/temp", b"21.5 C", 0, false));
    assert_eq!(line, "sensors/temp q0 21.5 C");
}

#[test]
fn test_text_retained_marker() {
    let f = formatter(FormatMode::Text);
    let line = f.format_message(&msg("a/b", b"on", 1, true));
    assert_eq!(line, "a/b q1 retained on");
}

#[test]
fn test_text_json_payload_compacted() {
    let f = formatter(FormatMode::Text);
    let line = f.format_message(&msg("t", b"{\"v\": 1}", 0, false));
    assert_eq!(line, "t q0 {\"v\":1}");
}

#[test]
fn test_text_binary_payload_placeholder() {
    let f = formatter(FormatMode::Text);
    let line = f.format_message(&msg("t", &[0xff, 0xfe, 0x00], 0, false));
    assert_eq!(line, "t q0 <3 bytes>");
}

#[test]
fn test_text_empty_payload() {
    let f = formatter(FormatMode::Text);
    let line = f.format_message(&msg("t", b"", 0, false));
    assert_eq!(line, "t q0 <empty>");
}

#[test]
fn test_text_timestamp_prefix() {
    let opts = OutputOptions {
        format: FormatMode::Text,
        timestamp: TimestampMode::Time,
        ..OutputOptions::default()
    };
    let f = Formatter::new(&opts).with_color(false);
    let line = f.format_message(&msg("t", b"x", 0, false));
    // HH:MM:SS.mmm prefix
    assert_eq!(line.len(), "00:00:00.000 t q0 x".len());
    assert!(line.ends_with(" t q0 x"));
}

// =============================================================================
// JSON Modes
// =============================================================================

#[test]
fn test_json_fields() {
    let f = formatter(FormatMode::Json);
    let line = f.format_message(&msg("a/b", b"{\"v\":2}", 1, true));

    let parsed: Value = serde_json::from_str(&line).expect("valid json");
    assert_eq!(parsed["topic"], "a/b");
    assert_eq!(parsed["qos"], 1);
    assert_eq!(parsed["retain"], true);
    assert_eq!(parsed["payload"]["v"], 2);
}

#[test]
fn test_json_text_payload_is_string() {
    let f = formatter(FormatMode::Json);
    let line = f.format_message(&msg("a", b"hello", 0, false));

    let parsed: Value = serde_json::from_str(&line).expect("valid json");
    assert_eq!(parsed["payload"], "hello");
}

#[test]
fn test_json_binary_payload_is_byte_count() {
    let f = formatter(FormatMode::Json);
    let line = f.format_message(&msg("a", &[0xff, 0xfe], 0, false));

    let parsed: Value = serde_json::from_str(&line).expect("valid json");
    assert_eq!(parsed["payload"]["bytes"], 2);
}

#[test]
fn test_compact_is_single_line() {
    let f = formatter(FormatMode::Compact);
    let line = f.format_message(&msg("a/b", b"{\"v\":2}", 0, false));
    assert!(!line.contains('\n'));

    let parsed: Value = serde_json::from_str(&line).expect("valid json");
    assert_eq!(parsed["topic"], "a/b");
}

// =============================================================================
// Raw Mode
// =============================================================================

#[test]
fn test_raw_payload_only() {
    let f = formatter(FormatMode::Raw);
    let line = f.format_message(&msg("ignored/topic", b"just the bytes", 2, true));
    assert_eq!(line, "just the bytes");
}

// =============================================================================
// Topic Decoration
// =============================================================================

#[test]
fn test_decorate_topic_no_color() {
    let f = formatter(FormatMode::Text);
    assert_eq!(f.decorate_topic("a/b"), "a/b");
}
