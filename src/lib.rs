//! # Telemetry Pipeline
//!
//! Collects raw hardware readings (CPU, GPU, RAM) from pluggable sources,
//! classifies them against thresholds and delivers the resulting entries to
//! console and file sinks without blocking the producers.
//!
//! ## Features
//!
//! - **Bounded buffering**: a fixed-capacity FIFO between producers and sinks
//! - **Backpressure**: block, block with timeout, or reject when the queue is full
//! - **Fan-out**: every entry reaches every registered sink
//! - **Fault isolation**: a failing or panicking sink never affects the others
//! - **Graceful shutdown**: everything accepted before shutdown is delivered
//!
//! ## Example
//!
//! ```
//! use telemetry_pipeline::prelude::*;
//!
//! let dispatcher = Dispatcher::new(100, 2).unwrap();
//! dispatcher.add_sink(std::sync::Arc::new(ConsoleSink::new())).unwrap();
//!
//! let formatter = LogFormatter::new("Demo", ThresholdPolicy::cpu());
//! let entry = formatter.format("82.5").unwrap();
//! assert_eq!(entry.severity, Severity::Warning);
//!
//! dispatcher.log(entry).unwrap();
//! dispatcher.shutdown();
//! ```

pub mod app;
pub mod config;
pub mod core;
pub mod formatter;
pub mod shutdown;
pub mod sinks;
pub mod sources;

pub mod prelude {
    pub use crate::app::TelemetryApp;
    pub use crate::config::{AppConfig, PipelineConfig, SinkConfig, SourceConfig};
    pub use crate::core::{
        BackpressurePolicy, DispatchMode, Dispatcher, DispatcherBuilder, DispatcherState,
        LogEntry, LogSink, OutputFormat, PipelineError, PipelineMetrics, Result, Severity,
        SinkId, TimestampFormat,
    };
    pub use crate::formatter::{LogFormatter, TelemetryType, ThresholdPolicy};
    pub use crate::sinks::{ConsoleSink, FileSink};
    pub use crate::sources::{FileSource, ProxySource, TelemetryClient, TelemetrySource};
}

pub use app::TelemetryApp;
pub use config::{AppConfig, PipelineConfig, SinkConfig, SinkType, SourceConfig, SourceType};
pub use core::{
    BackpressurePolicy, BoundedQueue, DispatchMode, Dispatcher, DispatcherBuilder,
    DispatcherState, LogEntry, LogSink, OutputFormat, PipelineError, PipelineMetrics, Result,
    Severity, SinkId, SinkRegistry, TimestampFormat, WorkerPool,
};
pub use formatter::{LogFormatter, TelemetryType, ThresholdPolicy};
pub use sinks::{ConsoleSink, FileSink};
pub use sources::{FileSource, ProxySource, TelemetryClient, TelemetrySource};
