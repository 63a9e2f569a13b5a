//! Output format configuration for rendered entries
//!
//! - Text: `[timestamp] <SEVERITY> (app - context) : message` (default)
//! - Json: one JSON object per line
//! - Logfmt: key=value pairs

use super::log_entry::LogEntry;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Example: `[2025-01-08T10:30:45.123Z] <WARNING> (TelemetryApp - CPU) : CPU usage at 80.00%`
    #[default]
    Text,

    /// Example: `{"timestamp":"2025-01-08T10:30:45.123Z","severity":"WARNING","app":"TelemetryApp",...}`
    Json,

    /// Example: `timestamp=2025-01-08T10:30:45.123Z severity=WARNING app=TelemetryApp context=CPU message="..."`
    Logfmt,
}

impl OutputFormat {
    /// Format an entry according to this output format
    pub fn format(&self, entry: &LogEntry, timestamp_format: &TimestampFormat) -> String {
        match self {
            OutputFormat::Text => entry.to_line(timestamp_format),
            OutputFormat::Json => self.format_json(entry, timestamp_format),
            OutputFormat::Logfmt => self.format_logfmt(entry, timestamp_format),
        }
    }

    fn format_json(&self, entry: &LogEntry, timestamp_format: &TimestampFormat) -> String {
        let mut json_obj = serde_json::Map::new();

        json_obj.insert(
            "timestamp".to_string(),
            self.format_timestamp_json(entry, timestamp_format),
        );
        json_obj.insert(
            "severity".to_string(),
            serde_json::Value::String(entry.severity.as_str().to_string()),
        );
        json_obj.insert(
            "app".to_string(),
            serde_json::Value::String(entry.app_name.clone()),
        );
        json_obj.insert(
            "context".to_string(),
            serde_json::Value::String(entry.context.clone()),
        );
        json_obj.insert(
            "message".to_string(),
            serde_json::Value::String(entry.message.clone()),
        );

        serde_json::Value::Object(json_obj).to_string()
    }

    fn format_timestamp_json(
        &self,
        entry: &LogEntry,
        timestamp_format: &TimestampFormat,
    ) -> serde_json::Value {
        match timestamp_format {
            TimestampFormat::Unix => serde_json::Value::Number(entry.timestamp.timestamp().into()),
            TimestampFormat::UnixMillis => {
                serde_json::Value::Number(entry.timestamp.timestamp_millis().into())
            }
            _ => serde_json::Value::String(timestamp_format.format(&entry.timestamp)),
        }
    }

    fn format_logfmt(&self, entry: &LogEntry, timestamp_format: &TimestampFormat) -> String {
        [
            format!(
                "timestamp={}",
                escape_logfmt_value(&timestamp_format.format(&entry.timestamp))
            ),
            format!("severity={}", entry.severity.as_str()),
            format!("app={}", escape_logfmt_value(&entry.app_name)),
            format!("context={}", escape_logfmt_value(&entry.context)),
            // message is always quoted
            format!("message={}", quote_logfmt_value(&entry.message)),
        ]
        .join(" ")
    }
}

fn escape_logfmt_value(value: &str) -> String {
    if value.is_empty() || value.contains(' ') || value.contains('"') || value.contains('=') {
        quote_logfmt_value(value)
    } else {
        value.to_string()
    }
}

fn quote_logfmt_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
