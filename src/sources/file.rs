//! File-backed telemetry source

use super::TelemetrySource;
use crate::core::{PipelineError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Yields one line of a text file per read.
///
/// Reaching the end of the file is not the end of the source: reads at EOF
/// return `Some("")` and later reads pick up lines appended meanwhile.
pub struct FileSource {
    path: PathBuf,
    name: String,
    reader: Option<BufReader<File>>,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = format!("file:{}", path.display());
        Self {
            path,
            name,
            reader: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }
}

impl TelemetrySource for FileSource {
    fn open(&mut self) -> Result<()> {
        let file = File::open(&self.path)
            .map_err(|e| PipelineError::source_unavailable(&self.name, e.to_string()))?;
        self.reader = Some(BufReader::new(file));
        Ok(())
    }

    fn read(&mut self) -> Option<String> {
        let reader = self.reader.as_mut()?;
        let mut line = String::new();
        match reader.read_line(&mut line) {
            // nothing new yet; keep the reader to follow appends
            Ok(0) => Some(String::new()),
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_lines_then_waits_at_eof() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "12.5").unwrap();
        writeln!(file).unwrap();
        write!(file, "99").unwrap();

        let mut source = FileSource::new(file.path());
        source.open().unwrap();

        assert_eq!(source.read().as_deref(), Some("12.5"));
        assert_eq!(source.read().as_deref(), Some(""));
        assert_eq!(source.read().as_deref(), Some("99"));
        assert_eq!(source.read().as_deref(), Some(""));
        assert!(source.is_open());
    }

    #[test]
    fn test_follows_appended_lines_after_eof() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "10").unwrap();
        file.flush().unwrap();

        let mut source = FileSource::new(file.path());
        source.open().unwrap();
        assert_eq!(source.read().as_deref(), Some("10"));
        assert_eq!(source.read().as_deref(), Some(""));

        writeln!(file, "95").unwrap();
        file.flush().unwrap();

        assert_eq!(source.read().as_deref(), Some("95"));
        assert_eq!(source.read().as_deref(), Some(""));
    }

    #[test]
    fn test_read_before_open() {
        let mut source = FileSource::new("/nonexistent/readings.txt");
        assert_eq!(source.read(), None);
    }

    #[test]
    fn test_open_missing_file() {
        let mut source = FileSource::new("/nonexistent/readings.txt");
        assert!(matches!(
            source.open(),
            Err(PipelineError::SourceUnavailable { .. })
        ));
    }
}
