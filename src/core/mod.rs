//! Core pipeline types and traits

pub mod backpressure;
pub mod bounded_queue;
pub mod dispatcher;
pub mod error;
pub mod log_entry;
pub mod metrics;
pub mod output_format;
pub mod severity;
pub mod sink;
pub mod sink_registry;
pub mod timestamp;
pub mod worker_pool;

pub use backpressure::BackpressurePolicy;
pub use bounded_queue::{BoundedQueue, PushError, PushTimeoutError, TryPushError};
pub use dispatcher::{
    DispatchMode, Dispatcher, DispatcherBuilder, DispatcherState, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_WORKERS,
};
pub use error::{PipelineError, Result};
pub use log_entry::LogEntry;
pub use metrics::PipelineMetrics;
pub use output_format::OutputFormat;
pub use severity::Severity;
pub use sink::LogSink;
pub use sink_registry::{SinkId, SinkRegistry};
pub use timestamp::TimestampFormat;
pub use worker_pool::{Task, WorkerPool};
