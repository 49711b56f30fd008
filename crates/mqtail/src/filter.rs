//! Message filter pipeline
//!
//! An ordered list of predicate stages evaluated left-to-right with
//! short-circuit semantics. Stage order is fixed: the retained-flag check
//! costs nothing, the topic match needs no payload access, and only the
//! payload match pays for text decoding.

use mqtail_config::FilterOptions;
use mqtail_engine::MessageEvent;
use regex::Regex;
use thiserror::Error;

/// Filter compilation errors, fatal before any connect attempt
#[derive(Debug, Error)]
pub enum FilterError {
    /// Topic filter pattern failed to compile
    #[error("invalid topic filter pattern: {0}")]
    TopicPattern(#[source] regex::Error),

    /// Payload filter pattern failed to compile
    #[error("invalid payload filter pattern: {0}")]
    PayloadPattern(#[source] regex::Error),
}

/// One predicate stage in the pipeline
#[derive(Debug)]
enum Stage {
    /// Drop retained messages
    DropRetained,
    /// Topic must match the pattern
    Topic(Regex),
    /// Payload (decoded as text) must match the pattern
    Payload(Regex),
}

impl Stage {
    fn accepts(&self, msg: &MessageEvent) -> bool {
        match self {
            Stage::DropRetained => !msg.retain,
            Stage::Topic(re) => re.is_match(&msg.topic),
            Stage::Payload(re) => re.is_match(&String::from_utf8_lossy(&msg.payload)),
        }
    }
}

/// The compiled filter pipeline, immutable after startup
#[derive(Debug)]
pub struct FilterSet {
    stages: Vec<Stage>,
}

impl FilterSet {
    /// Compile the configured filters into the fixed stage order
    ///
    /// # Errors
    ///
    /// Returns a [`FilterError`] if either pattern fails to compile.
    pub fn compile(opts: &FilterOptions) -> Result<Self, FilterError> {
        let mut stages = Vec::new();

        if !opts.show_retained {
            stages.push(Stage::DropRetained);
        }
        if let Some(pattern) = &opts.topic_pattern {
            stages.push(Stage::Topic(
                Regex::new(pattern).map_err(FilterError::TopicPattern)?,
            ));
        }
        if let Some(pattern) = &opts.payload_pattern {
            stages.push(Stage::Payload(
                Regex::new(pattern).map_err(FilterError::PayloadPattern)?,
            ));
        }

        Ok(Self { stages })
    }

    /// Whether a message survives every configured stage
    pub fn matches(&self, msg: &MessageEvent) -> bool {
        self.stages.iter().all(|stage| stage.accepts(msg))
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod filter_test;
