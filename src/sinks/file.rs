//! File sink implementation

use crate::core::{LogEntry, LogSink, OutputFormat, PipelineError, Result, TimestampFormat};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends one rendered line per entry to a file.
///
/// Concurrent writes are serialized by an internal lock, so lines from
/// different workers never interleave.
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
    timestamp_format: TimestampFormat,
    output_format: OutputFormat,
}

impl FileSink {
    /// Open `path` for appending, creating it if needed.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                PipelineError::io_operation("opening file sink", path.display().to_string(), e)
            })?;

        Ok(Self {
            path,
            writer: Mutex::new(Some(BufWriter::new(file))),
            timestamp_format: TimestampFormat::default(),
            output_format: OutputFormat::default(),
        })
    }

    /// Set the timestamp format for this sink
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use telemetry_pipeline::sinks::FileSink;
    /// use telemetry_pipeline::TimestampFormat;
    ///
    /// let sink = FileSink::new("/var/log/telemetry.log")
    ///     .unwrap()
    ///     .with_timestamp_format(TimestampFormat::Rfc3339);
    /// ```
    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the file. Later writes fail with `SinkError`.
    pub fn close(&self) -> Result<()> {
        if let Some(mut writer) = self.writer.lock().take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl LogSink for FileSink {
    fn write(&self, entry: &LogEntry) -> Result<()> {
        let mut line = self.output_format.format(entry, &self.timestamp_format);
        line.push('\n');

        let mut guard = self.writer.lock();
        let writer = guard
            .as_mut()
            .ok_or_else(|| PipelineError::sink("file", "file sink is closed"))?;
        writer.write_all(line.as_bytes()).map_err(|e| {
            PipelineError::io_operation("writing entry", self.path.display().to_string(), e)
        })
    }

    fn flush(&self) -> Result<()> {
        if let Some(writer) = self.writer.lock().as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}
