//! Console sink implementation

use crate::core::{LogEntry, LogSink, OutputFormat, Result, Severity, TimestampFormat};
use std::io::Write;

pub struct ConsoleSink {
    use_colors: bool,
    timestamp_format: TimestampFormat,
    output_format: OutputFormat,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: cfg!(feature = "console"),
            timestamp_format: TimestampFormat::default(),
            output_format: OutputFormat::default(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors: use_colors && cfg!(feature = "console"),
            ..Self::new()
        }
    }

    /// Set the output format for this sink
    ///
    /// # Example
    ///
    /// ```
    /// use telemetry_pipeline::sinks::ConsoleSink;
    /// use telemetry_pipeline::OutputFormat;
    ///
    /// let sink = ConsoleSink::new().with_output_format(OutputFormat::Json);
    /// ```
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    fn render(&self, entry: &LogEntry) -> String {
        match self.output_format {
            OutputFormat::Text if self.use_colors => self.format_colored(entry),
            _ => self.output_format.format(entry, &self.timestamp_format),
        }
    }

    #[cfg(feature = "console")]
    fn format_colored(&self, entry: &LogEntry) -> String {
        use colored::Colorize;

        let severity = entry
            .severity
            .as_str()
            .color(entry.severity.color_code())
            .to_string();

        format!(
            "[{}] <{}> ({} - {}) : {}",
            self.timestamp_format.format(&entry.timestamp),
            severity,
            entry.app_name,
            entry.context,
            entry.message
        )
    }

    #[cfg(not(feature = "console"))]
    fn format_colored(&self, entry: &LogEntry) -> String {
        entry.to_line(&self.timestamp_format)
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for ConsoleSink {
    fn write(&self, entry: &LogEntry) -> Result<()> {
        let output = self.render(entry);

        // Locking keeps lines from concurrent workers whole
        match entry.severity {
            Severity::Critical => writeln!(std::io::stderr().lock(), "{}", output)?,
            _ => writeln!(std::io::stdout().lock(), "{}", output)?,
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
