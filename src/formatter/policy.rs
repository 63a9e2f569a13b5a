//! Threshold policies per telemetry type

use crate::core::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of hardware reading a source produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryType {
    Cpu,
    Gpu,
    Ram,
}

impl TelemetryType {
    /// Context label carried by entries of this type
    pub fn label(&self) -> &'static str {
        match self {
            TelemetryType::Cpu => "CPU",
            TelemetryType::Gpu => "GPU",
            TelemetryType::Ram => "RAM",
        }
    }

    pub fn default_policy(&self) -> ThresholdPolicy {
        match self {
            TelemetryType::Cpu => ThresholdPolicy::cpu(),
            TelemetryType::Gpu => ThresholdPolicy::gpu(),
            TelemetryType::Ram => ThresholdPolicy::ram(),
        }
    }
}

impl fmt::Display for TelemetryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TelemetryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CPU" => Ok(TelemetryType::Cpu),
            "GPU" => Ok(TelemetryType::Gpu),
            "RAM" => Ok(TelemetryType::Ram),
            _ => Err(format!("Invalid telemetry type: '{}'", s)),
        }
    }
}

/// Warning and critical thresholds for one telemetry type.
///
/// A reading is `Critical` above `critical`, `Warning` above `warning`, and
/// `Info` otherwise. A reading equal to a threshold stays at the lower level.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdPolicy {
    pub telemetry_type: TelemetryType,
    pub unit: &'static str,
    pub warning: f64,
    pub critical: f64,
}

impl ThresholdPolicy {
    pub const fn cpu() -> Self {
        Self {
            telemetry_type: TelemetryType::Cpu,
            unit: "%",
            warning: 75.0,
            critical: 90.0,
        }
    }

    pub const fn gpu() -> Self {
        Self {
            telemetry_type: TelemetryType::Gpu,
            unit: "%",
            warning: 80.0,
            critical: 95.0,
        }
    }

    pub const fn ram() -> Self {
        Self {
            telemetry_type: TelemetryType::Ram,
            unit: "MB",
            warning: 70.0,
            critical: 85.0,
        }
    }

    pub fn context(&self) -> &'static str {
        self.telemetry_type.label()
    }

    pub fn classify(&self, value: f64) -> Severity {
        Severity::classify(value, self.warning, self.critical)
    }
}
