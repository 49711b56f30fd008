//! Output options shared between the resolver and the formatter

use serde::Deserialize;

/// How a forwarded message is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatMode {
    /// Human-readable text (default for TTY)
    #[default]
    Text,
    /// Full JSON with decoded payload
    Json,
    /// Compact single-line JSON
    Compact,
    /// Payload bytes only, one message per line
    Raw,
}

impl FormatMode {
    /// Parse the user-facing name, accepting short aliases
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "t" => Some(FormatMode::Text),
            "json" | "j" => Some(FormatMode::Json),
            "compact" | "c" => Some(FormatMode::Compact),
            "raw" | "r" => Some(FormatMode::Raw),
            _ => None,
        }
    }
}

/// Timestamp prefix for text output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampMode {
    /// No timestamp
    None,
    /// Local time of day (HH:MM:SS.mmm)
    #[default]
    Time,
    /// Full local date and time
    DateTime,
}

impl TimestampMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Some(TimestampMode::None),
            "time" => Some(TimestampMode::Time),
            "datetime" | "date" => Some(TimestampMode::DateTime),
            _ => None,
        }
    }
}

/// When to emit ANSI color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when stdout is a TTY
    #[default]
    Auto,
    Always,
    Never,
}

/// Status-channel verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Errors only
    Quiet,
    #[default]
    Normal,
    /// Include per-event diagnostics
    Verbose,
}

/// Output options section of the resolved record
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Message rendering mode
    pub format: FormatMode,
    /// Timestamp prefix mode (text output only)
    pub timestamp: TimestampMode,
    /// ANSI color policy
    pub color: ColorMode,
    /// Status channel verbosity
    pub verbosity: Verbosity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mode_parse_aliases() {
        assert_eq!(FormatMode::parse("text"), Some(FormatMode::Text));
        assert_eq!(FormatMode::parse("J"), Some(FormatMode::Json));
        assert_eq!(FormatMode::parse("compact"), Some(FormatMode::Compact));
        assert_eq!(FormatMode::parse("r"), Some(FormatMode::Raw));
        assert_eq!(FormatMode::parse("yaml"), None);
    }

    #[test]
    fn test_timestamp_mode_parse() {
        assert_eq!(TimestampMode::parse("none"), Some(TimestampMode::None));
        assert_eq!(TimestampMode::parse("time"), Some(TimestampMode::Time));
        assert_eq!(
            TimestampMode::parse("datetime"),
            Some(TimestampMode::DateTime)
        );
        assert_eq!(TimestampMode::parse("bogus"), None);
    }
}
