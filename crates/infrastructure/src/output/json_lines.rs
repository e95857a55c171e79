//! JSON-lines file sink
//!
//! Writes one JSON object per test report to a file. The file is flushed
//! and closed when the sink is finalized.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use gauntlet_application::ports::{OutputSink, SinkError};
use gauntlet_domain::TestReport;
use tracing::warn;

/// Streams reports to a `.jsonl` file.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    error: Option<SinkError>,
}

impl JsonLinesSink {
    /// Creates (or truncates) the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            error: None,
        })
    }

    /// Path of the output file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_report(writer: &mut BufWriter<File>, report: &TestReport) -> Result<(), SinkError> {
        serde_json::to_writer(&mut *writer, report)
            .map_err(|e| SinkError::Serialization(e.to_string()))?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl OutputSink for JsonLinesSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn receive(&mut self, report: &TestReport) {
        let Some(writer) = self.writer.as_mut() else {
            warn!(path = %self.path.display(), "report received after finalize, dropping it");
            return;
        };
        if let Err(e) = Self::write_report(writer, report)
            && self.error.is_none()
        {
            self.error = Some(e);
        }
    }

    fn finalize(&mut self) -> Result<(), SinkError> {
        // Taking the writer closes the file when it goes out of scope.
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        self.error.take().map_or(Ok(()), Err)
    }
}
