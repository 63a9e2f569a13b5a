//! Application configuration
//!
//! Loaded once from a JSON file at startup:
//!
//! ```json
//! {
//!   "appName": "TelemetryApp",
//!   "pipeline": { "queueCapacity": 1000, "workers": 4, "backpressure": "block" },
//!   "sources": [
//!     { "sourceType": "file", "path": "cpu.txt", "telemetryType": "cpu", "rateMs": 500 }
//!   ],
//!   "sinks": [
//!     { "sinkType": "console" },
//!     { "sinkType": "file", "path": "telemetry.log", "format": "json" }
//!   ]
//! }
//! ```

use crate::core::{
    BackpressurePolicy, DispatchMode, OutputFormat, PipelineError, Result,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS,
};
use crate::formatter::TelemetryType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_app_name() -> String {
    "TelemetryApp".to_string()
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_poll_interval_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    pub sources: Vec<SourceConfig>,

    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    #[default]
    Pooled,
    Synchronous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Ignored in synchronous mode
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub mode: PipelineMode,

    #[serde(default)]
    pub backpressure: BackpressurePolicy,
}

impl PipelineConfig {
    pub fn dispatch_mode(&self) -> DispatchMode {
        match self.mode {
            PipelineMode::Pooled => DispatchMode::Pooled {
                workers: self.workers,
            },
            PipelineMode::Synchronous => DispatchMode::Synchronous,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            workers: DEFAULT_WORKERS,
            mode: PipelineMode::default(),
            backpressure: BackpressurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    File,
    Socket,
    Proxy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub source_type: SourceType,

    /// File path or socket path; unused by proxy sources
    #[serde(default)]
    pub path: PathBuf,

    pub telemetry_type: TelemetryType,

    #[serde(default = "default_poll_interval_ms", alias = "rateMs")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkType {
    Console,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkConfig {
    pub sink_type: SinkType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub format: OutputFormat,
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            PipelineError::io_operation("reading config", path.display().to_string(), e)
        })?;
        Self::from_json_str(&contents)
    }

    /// Reject settings the pipeline cannot start with
    pub fn validate(&self) -> Result<()> {
        let pipeline = &self.pipeline;
        if pipeline.queue_capacity == 0 {
            return Err(PipelineError::config(
                "pipeline",
                "queueCapacity must be greater than 0",
            ));
        }
        if pipeline.mode == PipelineMode::Pooled && pipeline.workers == 0 {
            return Err(PipelineError::config(
                "pipeline",
                "workers must be greater than 0",
            ));
        }

        if self.sources.is_empty() {
            return Err(PipelineError::config(
                "sources",
                "at least one source is required",
            ));
        }

        for (index, source) in self.sources.iter().enumerate() {
            if source.poll_interval_ms == 0 {
                return Err(PipelineError::config(
                    format!("sources[{}]", index),
                    "pollIntervalMs must be greater than 0",
                ));
            }
            if source.source_type != SourceType::Proxy && source.path.as_os_str().is_empty() {
                return Err(PipelineError::config(
                    format!("sources[{}]", index),
                    "path is required",
                ));
            }
        }

        for (index, sink) in self.sinks.iter().enumerate() {
            if sink.sink_type == SinkType::File && sink.path.is_none() {
                return Err(PipelineError::config(
                    format!("sinks[{}]", index),
                    "file sink requires a path",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const FULL: &str = r#"{
        "appName": "Monitor",
        "pipeline": {
            "queueCapacity": 64,
            "workers": 2,
            "backpressure": { "blockWithTimeout": 200 }
        },
        "sources": [
            { "sourceType": "file", "path": "cpu.txt", "telemetryType": "cpu", "rateMs": 250 },
            { "sourceType": "socket", "path": "/tmp/gpu.sock", "telemetryType": "gpu" }
        ],
        "sinks": [
            { "sinkType": "console" },
            { "sinkType": "file", "path": "out.log", "format": "json" }
        ]
    }"#;

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::from_json_str(FULL).unwrap();

        assert_eq!(config.app_name, "Monitor");
        assert_eq!(config.pipeline.queue_capacity, 64);
        assert_eq!(
            config.pipeline.dispatch_mode(),
            DispatchMode::Pooled { workers: 2 }
        );
        assert_eq!(
            config.pipeline.backpressure,
            BackpressurePolicy::BlockWithTimeout(Duration::from_millis(200))
        );

        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].poll_interval_ms, 250);
        assert_eq!(config.sources[1].poll_interval_ms, 1000);
        assert_eq!(config.sources[1].telemetry_type, TelemetryType::Gpu);

        assert_eq!(config.sinks[1].format, OutputFormat::Json);
        assert_eq!(config.sinks[1].path, Some(PathBuf::from("out.log")));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_json_str(
            r#"{ "sources": [{ "sourceType": "file", "path": "a", "telemetryType": "ram" }] }"#,
        )
        .unwrap();

        assert_eq!(config.app_name, "TelemetryApp");
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert!(config.sinks.is_empty());
    }

    #[test]
    fn test_synchronous_mode() {
        let config = AppConfig::from_json_str(
            r#"{
                "pipeline": { "mode": "synchronous", "workers": 0 },
                "sources": [{ "sourceType": "file", "path": "a", "telemetryType": "cpu" }]
            }"#,
        )
        .unwrap();
        assert_eq!(config.pipeline.dispatch_mode(), DispatchMode::Synchronous);
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            r#"{ "pipeline": { "queueCapacity": 0 }, "sources": [{ "sourceType": "file", "path": "a", "telemetryType": "cpu" }] }"#,
            r#"{ "pipeline": { "workers": 0 }, "sources": [{ "sourceType": "file", "path": "a", "telemetryType": "cpu" }] }"#,
            r#"{ "sources": [] }"#,
            r#"{ "sources": [{ "sourceType": "file", "path": "a", "telemetryType": "cpu", "pollIntervalMs": 0 }] }"#,
            r#"{ "sources": [{ "sourceType": "file", "telemetryType": "cpu" }] }"#,
            r#"{ "sources": [{ "sourceType": "file", "path": "a", "telemetryType": "cpu" }], "sinks": [{ "sinkType": "file" }] }"#,
        ];

        for json in cases {
            assert!(
                matches!(
                    AppConfig::from_json_str(json),
                    Err(PipelineError::InvalidConfiguration { .. })
                ),
                "expected rejection: {}",
                json
            );
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            AppConfig::from_json_str("{ not json"),
            Err(PipelineError::JsonError(_))
        ));
        assert!(matches!(
            AppConfig::from_json_str(r#"{ "sources": [{ "sourceType": "pigeon", "path": "a", "telemetryType": "cpu" }] }"#),
            Err(PipelineError::JsonError(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, FULL).unwrap();
        assert_eq!(AppConfig::from_file(&path).unwrap().app_name, "Monitor");

        assert!(matches!(
            AppConfig::from_file(dir.path().join("missing.json")),
            Err(PipelineError::IoOperation { .. })
        ));
    }
}
