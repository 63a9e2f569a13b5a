//! Log entry structure

use super::severity::Severity;
use super::timestamp::TimestampFormat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One formatted telemetry record, ready for delivery.
///
/// Entries are never mutated once built. The dispatcher clones an entry once
/// per registered sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub app_name: String,
    pub context: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    /// Sanitize the message so one entry always renders as one line
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(
        app_name: impl Into<String>,
        context: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            context: context.into(),
            severity,
            timestamp: Utc::now(),
            message: Self::sanitize_message(&message.into()),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Render as `[timestamp] <SEVERITY> (app - context) : message`
    pub fn to_line(&self, timestamp_format: &TimestampFormat) -> String {
        format!(
            "[{}] <{}> ({} - {}) : {}",
            timestamp_format.format(&self.timestamp),
            self.severity.as_str(),
            self.app_name,
            self.context,
            self.message
        )
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line(&TimestampFormat::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_line_format() {
        let ts = Utc
            .with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .single()
            .expect("valid datetime");
        let entry = LogEntry::new("TelemetryApp", "CPU", Severity::Critical, "CPU usage at 92.50%")
            .with_timestamp(ts);

        assert_eq!(
            entry.to_line(&TimestampFormat::Plain),
            "[2025-03-01 12:00:00] <CRITICAL> (TelemetryApp - CPU) : CPU usage at 92.50%"
        );
    }

    #[test]
    fn test_message_sanitized() {
        let entry = LogEntry::new("app", "RAM", Severity::Info, "line1\n[fake] <CRITICAL>\tx");
        assert_eq!(entry.message, "line1\\n[fake] <CRITICAL>\\tx");
        assert_eq!(entry.to_string().lines().count(), 1);
    }

    #[test]
    fn test_clone_is_equal() {
        let entry = LogEntry::new("app", "GPU", Severity::Warning, "GPU usage at 81.00%");
        let copy = entry.clone();
        assert_eq!(entry, copy);
    }
}
