//! Output sink port

use gauntlet_domain::TestReport;
use thiserror::Error;

/// Errors raised by output sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A report could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The sink panicked while finalizing.
    #[error("sink panicked: {0}")]
    Panicked(String),
}

/// A pluggable reporting strategy.
///
/// A sink receives every test report of a run as soon as the test case
/// completes, then is finalized exactly once at the end of the run.
pub trait OutputSink: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Handles the report of one completed test case.
    ///
    /// Sinks cannot fail a run from here; write errors should be remembered
    /// and returned from [`OutputSink::finalize`].
    fn receive(&mut self, report: &TestReport);

    /// Releases external resources held by the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if pending output could not be written.
    fn finalize(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
