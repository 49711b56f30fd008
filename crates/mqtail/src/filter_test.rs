//! Tests for the message filter pipeline

use super::*;
use bytes::Bytes;

fn msg(topic: &str, payload: &[u8], retain: bool) -> MessageEvent {
    MessageEvent {
        topic: topic.to_string(),
        payload: Bytes::copy_from_slice(payload),
        qos: 0,
        retain,
    }
}

fn filters(
    topic: Option<&str>,
    payload: Option<&str>,
    show_retained: bool,
) -> FilterSet {
    let opts = FilterOptions {
        topic_pattern: topic.map(str::to_string),
        payload_pattern: payload.map(str::to_string),
        show_retained,
    };
    FilterSet::compile(&opts).expect("patterns should compile")
}

// =============================================================================
// Compilation
// =============================================================================

#[test]
fn test_compile_empty_passes_everything() {
    let f = filters(None, None, true);
    assert!(f.matches(&msg("any/topic", b"any payload", false)));
    assert!(f.matches(&msg("any/topic", b"any payload", true)));
}

#[test]
fn test_compile_invalid_topic_pattern() {
    let opts = FilterOptions {
        topic_pattern: Some("(unterminated".to_string()),
        payload_pattern: None,
        show_retained: true,
    };
    let err = FilterSet::compile(&opts).unwrap_err();
    assert!(matches!(err, FilterError::TopicPattern(_)));
}

#[test]
fn test_compile_invalid_payload_pattern() {
    let opts = FilterOptions {
        topic_pattern: None,
        payload_pattern: Some("[bad".to_string()),
        show_retained: true,
    };
    let err = FilterSet::compile(&opts).unwrap_err();
    assert!(matches!(err, FilterError::PayloadPattern(_)));
}

// =============================================================================
// Retained Stage
// =============================================================================

#[test]
fn test_retained_dropped_when_disallowed() {
    let f = filters(None, None, false);
    assert!(!f.matches(&msg("a/b", b"x", true)));
    assert!(f.matches(&msg("a/b", b"x", false)));
}

// Retained handling is independent of the topic/payload filter outcomes:
// all four combinations of (show_retained, retain).
#[test]
fn test_retained_independent_of_other_filters() {
    let allow = filters(Some("a/.*"), Some("x"), true);
    let deny = filters(Some("a/.*"), Some("x"), false);

    assert!(allow.matches(&msg("a/b", b"x", true)));
    assert!(allow.matches(&msg("a/b", b"x", false)));
    assert!(!deny.matches(&msg("a/b", b"x", true)));
    assert!(deny.matches(&msg("a/b", b"x", false)));
}

// =============================================================================
// Topic / Payload Stages
// =============================================================================

#[test]
fn test_topic_filter() {
    let f = filters(Some("^sensors/"), None, true);
    assert!(f.matches(&msg("sensors/temp", b"21.5", false)));
    assert!(!f.matches(&msg("actuators/fan", b"on", false)));
}

#[test]
fn test_payload_filter() {
    let f = filters(None, Some("error|warn"), true);
    assert!(f.matches(&msg("logs", b"warn: low battery", false)));
    assert!(!f.matches(&msg("logs", b"all good", false)));
}

#[test]
fn test_payload_filter_lossy_decode() {
    // Invalid UTF-8 bytes are replaced, not rejected, before matching
    let f = filters(None, Some("temp"), true);
    assert!(f.matches(&msg("t", b"temp\xff\xfe", false)));
    assert!(!f.matches(&msg("t", b"\xff\xfe", false)));
}

#[test]
fn test_filters_compose_as_and() {
    let f = filters(Some("^a/"), Some("on"), true);

    assert!(f.matches(&msg("a/b", b"on", false)));
    assert!(!f.matches(&msg("a/b", b"off", false)));
    assert!(!f.matches(&msg("b/a", b"on", false)));
    assert!(!f.matches(&msg("b/a", b"off", false)));
}
