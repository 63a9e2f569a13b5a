//! Telemetry sources
//!
//! A source produces raw readings, one string per [`TelemetrySource::read`].
//! The application formats each reading into an entry and hands it to the
//! dispatcher.

pub mod file;
pub mod proxy;
#[cfg(unix)]
pub mod socket;

pub use file::FileSource;
pub use proxy::{ProxySource, TelemetryClient};
#[cfg(unix)]
pub use socket::SocketSource;

use crate::config::{SourceConfig, SourceType};
use crate::core::{PipelineError, Result};

/// A producer of raw telemetry readings
pub trait TelemetrySource: Send {
    /// Acquire the underlying resource. Calling it again reopens.
    fn open(&mut self) -> Result<()>;

    /// Next reading.
    ///
    /// `None` means the source is closed for good. `Some("")` means no
    /// reading this time, for example a file at its current end; the caller
    /// skips it.
    fn read(&mut self) -> Option<String>;

    fn name(&self) -> &str;
}

/// Build the source described by one `sources[]` config entry.
///
/// Proxy sources wrap a client constructed by the caller, so they cannot be
/// built from configuration alone and are rejected here.
pub fn create_source(config: &SourceConfig) -> Result<Box<dyn TelemetrySource>> {
    match config.source_type {
        SourceType::File => Ok(Box::new(FileSource::new(&config.path))),
        #[cfg(unix)]
        SourceType::Socket => Ok(Box::new(SocketSource::new(&config.path))),
        #[cfg(not(unix))]
        SourceType::Socket => Err(PipelineError::config(
            "SocketSource",
            "unix domain sockets are not supported on this platform",
        )),
        SourceType::Proxy => Err(PipelineError::config(
            "ProxySource",
            "proxy sources need a client; register them with TelemetryApp::add_source",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::TelemetryType;
    use std::path::PathBuf;

    fn config(source_type: SourceType) -> SourceConfig {
        SourceConfig {
            source_type,
            path: PathBuf::from("/tmp/readings.txt"),
            telemetry_type: TelemetryType::Cpu,
            poll_interval_ms: 100,
        }
    }

    #[test]
    fn test_create_file_source() {
        let source = create_source(&config(SourceType::File)).unwrap();
        assert_eq!(source.name(), "file:/tmp/readings.txt");
    }

    #[test]
    fn test_proxy_source_rejected() {
        assert!(matches!(
            create_source(&config(SourceType::Proxy)),
            Err(PipelineError::InvalidConfiguration { .. })
        ));
    }
}
