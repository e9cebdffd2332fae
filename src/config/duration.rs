//! Human-readable interval parsing.
//!
//! Accepts unit-suffixed strings such as `"45s"`, `"9m0s"`, `"3m2s"`,
//! `"1h30m"` or `"250ms"`. Components may be concatenated or separated by
//! whitespace. A bare `"0"` is accepted as the zero interval.

use std::time::Duration;

use serde::Serializer;
use thiserror::Error;

/// Error returned for a malformed interval string.
#[derive(Debug, Error)]
#[error("malformed duration {input:?}: {reason}")]
pub struct DurationError {
    input: String,
    reason: String,
}

impl DurationError {
    /// The text that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Parse an interval string into a [`Duration`].
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(DurationError {
            input: input.to_string(),
            reason: "value is empty".to_string(),
        });
    }
    if text.chars().all(|c| c == '0') {
        return Ok(Duration::ZERO);
    }

    humantime::parse_duration(text).map_err(|e| DurationError {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Render a duration the way [`parse_duration`] reads it back.
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }
    humantime::format_duration(duration).to_string()
}

/// Serde adapter writing durations as interval strings.
pub(crate) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*duration))
}
