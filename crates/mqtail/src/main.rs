//! mqtail - Live-tail MQTT topics from the terminal
//!
//! # Usage
//!
//! ```bash
//! # Follow everything under a topic tree
//! mqtail 'sensors/#'
//!
//! # Stop after 10 messages matching a payload pattern
//! mqtail 'sensors/#' -m 'error' -n 10
//!
//! # TLS with a custom CA, JSON output for piping
//! mqtail 'fleet/+/status' -H broker.example.net --ca ca.pem -o json
//! ```
//!
//! Message lines go to stdout; all status and diagnostic output goes to
//! stderr, so the message stream can be piped without corruption.

mod controller;
mod filter;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mqtail_config::{ColorMode, FormatMode, Options, TimestampMode, Verbosity};
use mqtail_engine::{ConnectionParameters, SubscriptionSet};

use controller::Controller;
use filter::FilterSet;
use output::Formatter;

/// mqtail - Live-tail MQTT topics from the terminal
#[derive(Parser, Debug)]
#[command(name = "mqtail")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Topic patterns to subscribe to (`+`/`#` wildcards allowed)
    #[arg(value_name = "TOPIC")]
    topics: Vec<String>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, env = "MQTAIL_CONFIG")]
    config: Option<PathBuf>,

    /// Broker hostname or IP
    #[arg(short = 'H', long, env = "MQTAIL_HOST")]
    host: Option<String>,

    /// Broker port (default 1883, or 8883 with TLS)
    #[arg(short, long, env = "MQTAIL_PORT")]
    port: Option<u16>,

    /// Username for broker authentication
    #[arg(short, long, env = "MQTAIL_USERNAME")]
    username: Option<String>,

    /// Password for broker authentication
    #[arg(short = 'P', long, env = "MQTAIL_PASSWORD")]
    password: Option<String>,

    /// Client identifier (generated when absent)
    #[arg(short = 'i', long = "client-id", env = "MQTAIL_CLIENT_ID")]
    client_id: Option<String>,

    /// Enable TLS (implied by --ca/--cert/--key)
    #[arg(long)]
    tls: bool,

    /// Path to a CA certificate bundle (PEM)
    #[arg(long, value_name = "FILE", env = "MQTAIL_CA")]
    ca: Option<PathBuf>,

    /// Path to a client certificate (PEM)
    #[arg(long, value_name = "FILE", env = "MQTAIL_CERT")]
    cert: Option<PathBuf>,

    /// Path to a client private key (PEM)
    #[arg(long, value_name = "FILE", env = "MQTAIL_KEY")]
    key: Option<PathBuf>,

    /// Requested QoS for every subscription (0, 1 or 2)
    #[arg(short, long)]
    qos: Option<u8>,

    /// Stop after forwarding N messages
    #[arg(short = 'n', long = "count", value_name = "N")]
    count: Option<u64>,

    /// Forward only messages whose topic matches this regex
    #[arg(long = "topic-filter", value_name = "REGEX")]
    topic_filter: Option<String>,

    /// Forward only messages whose payload matches this regex
    #[arg(short = 'm', long = "match", value_name = "REGEX")]
    payload_filter: Option<String>,

    /// Drop retained messages
    #[arg(long = "no-retained")]
    no_retained: bool,

    /// Output format: text (default), json, compact, raw
    #[arg(short = 'o', long = "output", value_name = "FORMAT")]
    format: Option<String>,

    /// Timestamp prefix: none, time (default), datetime
    #[arg(long, value_name = "MODE")]
    timestamp: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Connect timeout per attempt, in seconds
    #[arg(long = "connect-timeout", value_name = "SECS")]
    connect_timeout: Option<u64>,

    /// Verbose output (show per-event diagnostics)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (suppress connection messages)
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(resolve_verbosity(&cli));

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut opts = load_options(cli.config.as_deref())?;
    apply_flags(&mut opts, &cli)?;
    opts.validate()?;

    // Everything that can fail at setup fails here, before any connect
    let filters = FilterSet::compile(&opts.filter)?;
    let params = ConnectionParameters::build(&opts)?;
    let subscriptions = SubscriptionSet::from_options(&opts);

    let use_color = match opts.output.color {
        ColorMode::Auto => atty::is(atty::Stream::Stdout),
        ColorMode::Always => true,
        ColorMode::Never => false,
    };
    let formatter = Formatter::new(&opts.output).with_color(use_color);

    tracing::info!(
        broker = %params.url(),
        client_id = %params.client_id,
        topics = subscriptions.len(),
        "connecting (Ctrl+C to stop)"
    );

    let (handle, events) = mqtail_engine::connect(&params);
    let controller = Controller::new(
        subscriptions,
        filters,
        formatter,
        opts.subscribe.max_messages,
        params.url(),
    );

    let code = controller.run(handle, events).await;
    Ok(ExitCode::from(code))
}

/// Load options: explicit `--config` must exist, the default path is
/// optional.
fn load_options(config: Option<&Path>) -> Result<Options> {
    if let Some(path) = config {
        return Ok(Options::from_file(path)?);
    }
    if let Some(path) = default_config_path() {
        if path.exists() {
            return Ok(Options::from_file(path)?);
        }
    }
    Ok(Options::default())
}

fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join("mqtail.toml"))
}

/// Overlay CLI flags on the loaded options; flags win over the file
fn apply_flags(opts: &mut Options, cli: &Cli) -> Result<()> {
    if !cli.topics.is_empty() {
        opts.subscribe.topics = cli.topics.clone();
    }
    if let Some(host) = &cli.host {
        opts.broker.host = host.clone();
    }
    if let Some(port) = cli.port {
        opts.broker.port = Some(port);
    }
    if let Some(username) = &cli.username {
        opts.broker.username = Some(username.clone());
    }
    if let Some(password) = &cli.password {
        opts.broker.password = Some(password.clone());
    }
    if let Some(client_id) = &cli.client_id {
        opts.broker.client_id = Some(client_id.clone());
    }
    if cli.tls {
        opts.broker.tls = true;
    }
    if let Some(ca) = &cli.ca {
        opts.broker.ca_path = Some(ca.display().to_string());
    }
    if let Some(cert) = &cli.cert {
        opts.broker.cert_path = Some(cert.display().to_string());
    }
    if let Some(key) = &cli.key {
        opts.broker.key_path = Some(key.display().to_string());
    }
    if let Some(secs) = cli.connect_timeout {
        opts.broker.connect_timeout_secs = secs;
    }
    if let Some(qos) = cli.qos {
        opts.subscribe.qos = qos;
    }
    if let Some(count) = cli.count {
        opts.subscribe.max_messages = Some(count);
    }
    if let Some(pattern) = &cli.topic_filter {
        opts.filter.topic_pattern = Some(pattern.clone());
    }
    if let Some(pattern) = &cli.payload_filter {
        opts.filter.payload_pattern = Some(pattern.clone());
    }
    if cli.no_retained {
        opts.filter.show_retained = false;
    }
    if let Some(format) = &cli.format {
        opts.output.format = match FormatMode::parse(format) {
            Some(mode) => mode,
            None => bail!("unknown output format '{format}' (expected text, json, compact or raw)"),
        };
    }
    if let Some(mode) = &cli.timestamp {
        opts.output.timestamp = match TimestampMode::parse(mode) {
            Some(mode) => mode,
            None => bail!("unknown timestamp mode '{mode}' (expected none, time or datetime)"),
        };
    }
    if cli.no_color {
        opts.output.color = ColorMode::Never;
    }
    if cli.verbose {
        opts.output.verbosity = Verbosity::Verbose;
    } else if cli.quiet {
        opts.output.verbosity = Verbosity::Quiet;
    }
    Ok(())
}

/// Resolve verbosity before logging init: CLI flags win, then the config
/// file, then normal.
fn resolve_verbosity(cli: &Cli) -> Verbosity {
    if cli.verbose {
        return Verbosity::Verbose;
    }
    if cli.quiet {
        return Verbosity::Quiet;
    }
    if let Ok(opts) = load_options(cli.config.as_deref()) {
        return opts.output.verbosity;
    }
    Verbosity::Normal
}

/// Initialize the tracing subscriber. Writer is stderr: stdout carries
/// message lines only.
fn init_logging(verbosity: Verbosity) {
    let filter = match verbosity {
        Verbosity::Verbose => EnvFilter::new("debug"),
        Verbosity::Normal => EnvFilter::new("info"),
        Verbosity::Quiet => EnvFilter::new("error"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .init();
}
