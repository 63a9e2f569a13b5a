//! Error types for the telemetry pipeline

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Queue full with buffer details
    #[error("Entry queue full: {current}/{max} entries buffered")]
    QueueFull { current: usize, max: usize },

    /// Dispatcher is draining or stopped and no longer accepts entries
    #[error("Pipeline is closed")]
    PipelineStopped,

    /// Worker pool has been shut down
    #[error("Worker pool is closed")]
    WorkerPoolClosed,

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// A sink failed to record an entry
    #[error("Sink '{sink}' failed: {message}")]
    SinkError { sink: String, message: String },

    /// A telemetry source could not be opened
    #[error("Source '{source_name}' unavailable: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    /// Raw reading could not be turned into a number
    #[error("Invalid telemetry reading: '{raw}'")]
    InvalidReading { raw: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        PipelineError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a queue full error with buffer details
    pub fn queue_full(current: usize, max: usize) -> Self {
        PipelineError::QueueFull { current, max }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a sink error
    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::SinkError {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a source unavailable error
    pub fn source_unavailable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::SourceUnavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid reading error
    pub fn invalid_reading(raw: impl Into<String>) -> Self {
        PipelineError::InvalidReading { raw: raw.into() }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PipelineError::Other(msg.into())
    }

    /// Whether this error means the pipeline refused work because it is shutting down
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            PipelineError::PipelineStopped | PipelineError::WorkerPoolClosed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PipelineError::queue_full(100, 1000);
        assert!(matches!(err, PipelineError::QueueFull { .. }));

        let err = PipelineError::config("Dispatcher", "queue capacity must be > 0");
        assert!(matches!(err, PipelineError::InvalidConfiguration { .. }));

        let err = PipelineError::sink("file", "disk full");
        assert!(matches!(err, PipelineError::SinkError { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = PipelineError::queue_full(100, 1000);
        assert_eq!(err.to_string(), "Entry queue full: 100/1000 entries buffered");

        let err = PipelineError::source_unavailable("cpu.txt", "No such file");
        assert_eq!(
            err.to_string(),
            "Source 'cpu.txt' unavailable: No such file"
        );

        let err = PipelineError::invalid_reading("abc123");
        assert_eq!(err.to_string(), "Invalid telemetry reading: 'abc123'");
    }

    #[test]
    fn test_closed_errors() {
        assert!(PipelineError::PipelineStopped.is_closed());
        assert!(PipelineError::WorkerPoolClosed.is_closed());
        assert!(!PipelineError::queue_full(1, 1).is_closed());
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = PipelineError::io_operation("opening sink file", "cannot open for append", io_err);

        assert!(matches!(err, PipelineError::IoOperation { .. }));
        assert!(err.to_string().contains("opening sink file"));
        assert!(err.to_string().contains("cannot open for append"));
    }
}
