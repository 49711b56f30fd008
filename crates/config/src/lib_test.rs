//! Tests for option loading and validation

use super::*;

fn valid() -> Options {
    let mut opts = Options::default();
    opts.subscribe.topics = vec!["sensors/#".to_string()];
    opts
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_empty_config_takes_defaults() {
    let opts: Options = "".parse().unwrap();
    assert_eq!(opts.broker.host, "localhost");
    assert_eq!(opts.broker.effective_port(), DEFAULT_PORT);
    assert_eq!(opts.subscribe.qos, 0);
    assert!(opts.filter.show_retained);
    assert!(opts.subscribe.max_messages.is_none());
}

#[test]
fn test_minimal_config_parses() {
    let opts: Options = r#"
        [broker]
        host = "broker.example.net"

        [subscribe]
        topics = ["sensors/#", "alerts/+/critical"]
        qos = 1
    "#
    .parse()
    .unwrap();

    assert_eq!(opts.broker.host, "broker.example.net");
    assert_eq!(opts.subscribe.topics.len(), 2);
    assert_eq!(opts.subscribe.qos, 1);
    opts.validate().unwrap();
}

#[test]
fn test_output_section_parses() {
    let opts: Options = r#"
        [output]
        format = "compact"
        timestamp = "none"
        color = "never"
        verbosity = "verbose"
    "#
    .parse()
    .unwrap();

    assert_eq!(opts.output.format, FormatMode::Compact);
    assert_eq!(opts.output.timestamp, TimestampMode::None);
    assert_eq!(opts.output.color, ColorMode::Never);
    assert_eq!(opts.output.verbosity, Verbosity::Verbose);
}

#[test]
fn test_invalid_toml_rejected() {
    let err = "[broker".parse::<Options>().unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Options::from_file("/nonexistent/mqtail.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

// =============================================================================
// Scheme / port derivation
// =============================================================================

#[test]
fn test_tls_implied_by_ca_path() {
    let mut opts = valid();
    opts.broker.ca_path = Some("/etc/ssl/ca.pem".to_string());
    assert!(opts.broker.tls_enabled());
    assert_eq!(opts.broker.effective_port(), DEFAULT_TLS_PORT);
}

#[test]
fn test_explicit_port_wins_over_scheme_default() {
    let mut opts = valid();
    opts.broker.tls = true;
    opts.broker.port = Some(1884);
    assert_eq!(opts.broker.effective_port(), 1884);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_validate_rejects_bad_qos() {
    let mut opts = valid();
    opts.subscribe.qos = 3;
    assert!(matches!(
        opts.validate().unwrap_err(),
        ConfigError::InvalidQos { qos: 3 }
    ));
}

#[test]
fn test_validate_rejects_zero_limit() {
    let mut opts = valid();
    opts.subscribe.max_messages = Some(0);
    assert!(matches!(
        opts.validate().unwrap_err(),
        ConfigError::InvalidLimit { limit: 0 }
    ));
}

#[test]
fn test_validate_rejects_cert_without_key() {
    let mut opts = valid();
    opts.broker.cert_path = Some("client.pem".to_string());
    assert!(matches!(
        opts.validate().unwrap_err(),
        ConfigError::IncompleteClientAuth
    ));
}

#[test]
fn test_validate_rejects_no_topics() {
    let opts = Options::default();
    assert!(matches!(
        opts.validate().unwrap_err(),
        ConfigError::NoTopics
    ));
}

#[test]
fn test_validate_rejects_empty_topic() {
    let mut opts = valid();
    opts.subscribe.topics.push(String::new());
    assert!(matches!(
        opts.validate().unwrap_err(),
        ConfigError::EmptyTopic
    ));
}
