//! Console output sink
//!
//! Prints one line per test case as it completes and a summary line when
//! the run is finalized.

use std::io::{self, Write};

use gauntlet_application::ports::{OutputSink, SinkError};
use gauntlet_domain::{Outcome, RunSummary, TestReport};

/// Progressive plain-text reporter.
pub struct ConsoleSink {
    out: Box<dyn Write + Send>,
    summary: RunSummary,
    error: Option<io::Error>,
}

impl ConsoleSink {
    /// Creates a sink printing to stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Creates a sink printing to `out`.
    #[must_use]
    pub fn with_writer(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Box::new(out),
            summary: RunSummary::default(),
            error: None,
        }
    }

    fn write_report(&mut self, report: &TestReport) -> io::Result<()> {
        let label = report.kind().label();
        match &report.outcome {
            Outcome::Passed => {
                writeln!(self.out, "{label} {} ({:.2?})", report.name, report.duration)?;
            }
            Outcome::Failed { diagnostics } => {
                writeln!(self.out, "{label} {} ({:.2?})", report.name, report.duration)?;
                if let Some(request) = &report.request {
                    writeln!(self.out, "    {} {}", request.method, request.url)?;
                }
                for diagnostic in diagnostics {
                    writeln!(self.out, "    {diagnostic}")?;
                }
            }
            Outcome::Skipped { reason } => writeln!(self.out, "{label} {}: {reason}", report.name)?,
            Outcome::Broken { cause } => writeln!(self.out, "{label} {}: {cause}", report.name)?,
        }
        self.out.flush()
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn receive(&mut self, report: &TestReport) {
        self.summary.record(report.kind());
        self.summary.duration += report.duration;
        if let Err(e) = self.write_report(report)
            && self.error.is_none()
        {
            self.error = Some(e);
        }
    }

    fn finalize(&mut self) -> Result<(), SinkError> {
        if let Some(e) = self.error.take() {
            return Err(e.into());
        }
        writeln!(self.out)?;
        writeln!(self.out, "{}", self.summary)?;
        self.out.flush()?;
        Ok(())
    }
}
