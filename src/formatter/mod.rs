//! Turns raw readings into classified entries

pub mod policy;

pub use policy::{TelemetryType, ThresholdPolicy};

use crate::core::{LogEntry, PipelineError, Result};

/// Parses raw readings for one application and telemetry type
///
/// # Example
///
/// ```
/// use telemetry_pipeline::{LogFormatter, Severity, ThresholdPolicy};
///
/// let formatter = LogFormatter::new("Monitor", ThresholdPolicy::cpu());
/// let entry = formatter.format(" 91.5 ").unwrap();
/// assert_eq!(entry.severity, Severity::Critical);
/// assert_eq!(entry.message, "CPU usage at 91.50%");
///
/// assert!(formatter.format("abc123").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct LogFormatter {
    app_name: String,
    policy: ThresholdPolicy,
}

impl LogFormatter {
    pub fn new(app_name: impl Into<String>, policy: ThresholdPolicy) -> Self {
        Self {
            app_name: app_name.into(),
            policy,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    /// Parse a reading. Surrounding whitespace is ignored; anything that is
    /// not a finite number is an `InvalidReading`.
    pub fn parse_reading(raw: &str) -> Result<f64> {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(PipelineError::invalid_reading(raw)),
        }
    }

    pub fn format(&self, raw: &str) -> Result<LogEntry> {
        let value = Self::parse_reading(raw)?;
        let message = format!(
            "{} usage at {:.2}{}",
            self.policy.context(),
            value,
            self.policy.unit
        );

        Ok(LogEntry::new(
            self.app_name.clone(),
            self.policy.context(),
            self.policy.classify(value),
            message,
        ))
    }
}
