//! Sink implementations

pub mod console;
pub mod file;

pub use console::ConsoleSink;
pub use file::FileSink;

use crate::config::{SinkConfig, SinkType};
use crate::core::{LogSink, PipelineError, Result};
use std::sync::Arc;

/// Build the sink described by one `sinks[]` config entry
pub fn create_sink(config: &SinkConfig) -> Result<Arc<dyn LogSink>> {
    match config.sink_type {
        SinkType::Console => Ok(Arc::new(
            ConsoleSink::new().with_output_format(config.format),
        )),
        SinkType::File => {
            let path = config
                .path
                .as_ref()
                .ok_or_else(|| PipelineError::config("FileSink", "file sink requires a path"))?;
            Ok(Arc::new(
                FileSink::new(path)?.with_output_format(config.format),
            ))
        }
    }
}
