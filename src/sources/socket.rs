//! Unix domain socket telemetry source

use super::TelemetrySource;
use crate::core::{PipelineError, Result};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Connects to a stream socket and yields one newline-terminated reading
/// per read. The peer closing the connection ends the source.
pub struct SocketSource {
    path: PathBuf,
    name: String,
    reader: Option<BufReader<UnixStream>>,
}

impl SocketSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = format!("socket:{}", path.display());
        Self {
            path,
            name,
            reader: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.reader.is_some()
    }
}

impl TelemetrySource for SocketSource {
    fn open(&mut self) -> Result<()> {
        let stream = UnixStream::connect(&self.path)
            .map_err(|e| PipelineError::source_unavailable(&self.name, e.to_string()))?;
        debug!(source = %self.name, "connected");
        self.reader = Some(BufReader::new(stream));
        Ok(())
    }

    fn read(&mut self) -> Option<String> {
        let reader = self.reader.as_mut()?;
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                debug!(source = %self.name, "peer closed connection");
                self.reader = None;
                None
            }
            Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
            Err(e) => {
                warn!(source = %self.name, error = %e, "read failed, closing source");
                self.reader = None;
                None
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
