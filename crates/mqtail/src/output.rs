//! Output formatting for forwarded messages
//!
//! Renders one message into one display string per the active output mode.
//! The caller owns the write; message text never touches the status channel.

use chrono::Local;
use mqtail_config::{FormatMode, OutputOptions, TimestampMode};
use mqtail_engine::MessageEvent;
use owo_colors::{OwoColorize, Style};
use serde_json::Value;

/// Message formatter
pub struct Formatter {
    format: FormatMode,
    timestamp: TimestampMode,
    use_color: bool,
}

/// Color styles for terminal output
struct ColorStyles {
    timestamp: Style,
    topic: Style,
    meta: Style,
    retained: Style,
    payload: Style,
}

impl ColorStyles {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                timestamp: Style::new().dimmed(),
                topic: Style::new().cyan(),
                meta: Style::new().dimmed(),
                retained: Style::new().yellow(),
                payload: Style::new(),
            }
        } else {
            Self {
                timestamp: Style::new(),
                topic: Style::new(),
                meta: Style::new(),
                retained: Style::new(),
                payload: Style::new(),
            }
        }
    }
}

impl Formatter {
    /// Create a new formatter from the resolved output options
    pub fn new(opts: &OutputOptions) -> Self {
        Self {
            format: opts.format,
            timestamp: opts.timestamp,
            use_color: true, // Default on, caller sets based on TTY
        }
    }

    /// Enable or disable color output
    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    /// Render one message as a display string
    pub fn format_message(&self, msg: &MessageEvent) -> String {
        match self.format {
            FormatMode::Text => self.format_text(msg),
            FormatMode::Json => self.format_json(msg, true),
            FormatMode::Compact => self.format_json(msg, false),
            FormatMode::Raw => String::from_utf8_lossy(&msg.payload).into_owned(),
        }
    }

    /// Colored topic label for status lines
    pub fn decorate_topic(&self, topic: &str) -> String {
        let styles = ColorStyles::new(self.use_color);
        topic.style(styles.topic).to_string()
    }

    fn format_text(&self, msg: &MessageEvent) -> String {
        let styles = ColorStyles::new(self.use_color);
        let mut line = String::new();

        if let Some(ts) = self.render_timestamp() {
            line.push_str(&ts.style(styles.timestamp).to_string());
            line.push(' ');
        }

        line.push_str(&msg.topic.style(styles.topic).to_string());
        line.push(' ');
        line.push_str(&format!("q{}", msg.qos).style(styles.meta).to_string());

        if msg.retain {
            line.push(' ');
            line.push_str(&"retained".style(styles.retained).to_string());
        }

        line.push(' ');
        line.push_str(
            &payload_inline(&msg.payload)
                .style(styles.payload)
                .to_string(),
        );
        line
    }

    fn format_json(&self, msg: &MessageEvent, pretty: bool) -> String {
        let value = serde_json::json!({
            "topic": msg.topic,
            "qos": msg.qos,
            "retain": msg.retain,
            "payload": payload_value(&msg.payload),
        });

        // Serializing a Value cannot fail
        if pretty {
            serde_json::to_string_pretty(&value).unwrap_or_default()
        } else {
            serde_json::to_string(&value).unwrap_or_default()
        }
    }

    fn render_timestamp(&self) -> Option<String> {
        match self.timestamp {
            TimestampMode::None => None,
            TimestampMode::Time => Some(Local::now().format("%H:%M:%S%.3f").to_string()),
            TimestampMode::DateTime => {
                Some(Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            }
        }
    }
}

/// Inline payload rendering for text mode: compact JSON when it parses,
/// UTF-8 text otherwise, a byte-count placeholder for binary.
fn payload_inline(payload: &[u8]) -> String {
    if payload.is_empty() {
        return String::from("<empty>");
    }
    if let Ok(value) = serde_json::from_slice::<Value>(payload) {
        if let Ok(compact) = serde_json::to_string(&value) {
            return compact;
        }
    }
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<{} bytes>", payload.len()),
    }
}

/// Payload as a JSON value for the JSON output modes
fn payload_value(payload: &[u8]) -> Value {
    if let Ok(value) = serde_json::from_slice::<Value>(payload) {
        return value;
    }
    match std::str::from_utf8(payload) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => serde_json::json!({ "bytes": payload.len() }),
    }
}

#[cfg(test)]
#[path = "output_test.rs"]
mod output_test;
