//! Severity levels for telemetry entries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Info = 0,
    Warning = 1,
    Critical = 2,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Classify a reading against a pair of thresholds.
    ///
    /// Both comparisons are strict: a value equal to a threshold stays at the
    /// lower severity.
    ///
    /// ```
    /// use telemetry_pipeline::Severity;
    ///
    /// assert_eq!(Severity::classify(75.0, 75.0, 90.0), Severity::Info);
    /// assert_eq!(Severity::classify(90.0, 75.0, 90.0), Severity::Warning);
    /// assert_eq!(Severity::classify(90.1, 75.0, 90.0), Severity::Critical);
    /// ```
    pub fn classify(value: f64, warning_threshold: f64, critical_threshold: f64) -> Self {
        if value > critical_threshold {
            Severity::Critical
        } else if value > warning_threshold {
            Severity::Warning
        } else {
            Severity::Info
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Severity::Info => Green,
            Severity::Warning => Yellow,
            Severity::Critical => BrightRed,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INFO" => Ok(Severity::Info),
            "WARN" | "WARNING" => Ok(Severity::Warning),
            "CRITICAL" | "CRIT" => Ok(Severity::Critical),
            _ => Err(format!("Invalid severity: '{}'", s)),
        }
    }
}
