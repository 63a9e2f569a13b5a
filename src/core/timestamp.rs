//! Timestamp formatting for rendered entries
//!
//! Entries carry a UTC timestamp; sinks pick how it is rendered.

use super::error::{PipelineError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

const ISO8601: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Timestamp rendering options
///
/// # Examples
///
/// ```
/// use telemetry_pipeline::TimestampFormat;
/// use chrono::Utc;
///
/// let format = TimestampFormat::Iso8601;
/// let timestamp = format.format(&Utc::now());
/// assert!(timestamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// Date and time separated by a space, second precision: `2025-01-08 10:30:45`
    Plain,

    /// RFC 3339 format: `2025-01-08T10:30:45.123456+00:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format, e.g. `%d/%b/%Y:%H:%M:%S`
    Custom(String),
}

impl TimestampFormat {
    /// Custom strftime format, rejecting patterns chrono cannot render
    pub fn custom(pattern: impl Into<String>) -> Result<Self> {
        let format = TimestampFormat::Custom(pattern.into());
        format.validate()?;
        Ok(format)
    }

    /// Fails for a `Custom` pattern with an unknown or malformed specifier
    pub fn validate(&self) -> Result<()> {
        match self {
            TimestampFormat::Custom(pattern)
                if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) =>
            {
                Err(PipelineError::config(
                    "timestamp",
                    format!("invalid strftime pattern '{}'", pattern),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Render `datetime`. A `Custom` pattern that fails to render falls
    /// back to ISO 8601.
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format(ISO8601).to_string(),
            TimestampFormat::Plain => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(pattern) => {
                let mut out = String::new();
                if write!(out, "{}", datetime.format(pattern)).is_err() {
                    return datetime.format(ISO8601).to_string();
                }
                out
            }
        }
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimestampFormat::Unix | TimestampFormat::UnixMillis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.123456 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::microseconds(123456)
    }

    #[test]
    fn test_iso8601_format() {
        let result = TimestampFormat::Iso8601.format(&fixed_datetime());
        assert_eq!(result, "2025-01-08T10:30:45.123Z");
    }

    #[test]
    fn test_plain_format() {
        let result = TimestampFormat::Plain.format(&fixed_datetime());
        assert_eq!(result, "2025-01-08 10:30:45");
    }

    #[test]
    fn test_unix_formats() {
        let secs: i64 = TimestampFormat::Unix
            .format(&fixed_datetime())
            .parse()
            .expect("valid unix timestamp");
        let millis: i64 = TimestampFormat::UnixMillis
            .format(&fixed_datetime())
            .parse()
            .expect("valid unix millis timestamp");
        assert_eq!(millis / 1000, secs);
        assert!(TimestampFormat::Unix.is_numeric());
        assert!(!TimestampFormat::Plain.is_numeric());
    }

    #[test]
    fn test_custom_format() {
        let format = TimestampFormat::Custom("%d/%b/%Y:%H:%M:%S".to_string());
        assert_eq!(format.format(&fixed_datetime()), "08/Jan/2025:10:30:45");
    }

    #[test]
    fn test_invalid_custom_pattern_falls_back() {
        let format = TimestampFormat::Custom("%Q at %H".to_string());
        assert_eq!(format.format(&fixed_datetime()), "2025-01-08T10:30:45.123Z");

        let entry = crate::core::LogEntry::new("App", "CPU", crate::core::Severity::Info, "ok");
        assert!(entry.to_line(&format).starts_with('['));
    }

    #[test]
    fn test_custom_constructor_validates() {
        assert!(TimestampFormat::custom("%Q").is_err());
        assert!(TimestampFormat::custom("%Y-%m-%d %").is_err());

        let format = TimestampFormat::custom("%Y").expect("valid pattern");
        assert_eq!(format.format(&fixed_datetime()), "2025");
        assert!(TimestampFormat::Plain.validate().is_ok());
    }

    #[test]
    fn test_deserialization() {
        let format: TimestampFormat =
            serde_json::from_str("\"plain\"").expect("deserialize plain");
        assert_eq!(format, TimestampFormat::Plain);

        let format: TimestampFormat =
            serde_json::from_str(r#"{"custom":"%Y-%m-%d"}"#).expect("deserialize custom");
        assert_eq!(format, TimestampFormat::Custom("%Y-%m-%d".to_string()));
    }
}
