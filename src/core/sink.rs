//! Sink trait for entry destinations

use super::{error::Result, log_entry::LogEntry};

/// A destination that records or displays entries.
///
/// Writes take `&self`: the dispatcher's worker pool may call `write` on the
/// same sink from several threads at once, so implementations synchronize
/// internally.
pub trait LogSink: Send + Sync {
    fn write(&self, entry: &LogEntry) -> Result<()>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}
