//! Checker and output sink registries
//!
//! Both registries are filled while the run is configured and are only read
//! during the run loop. Order of registration is order of invocation.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use gauntlet_domain::{Diagnostic, ResponseSpec, TestCase, TestReport};
use tracing::{debug, error, warn};

use crate::error::RunError;
use crate::ports::{CheckError, Checker, OutputSink, SinkError};

/// Ordered set of checkers applied to every executed test case.
#[derive(Default)]
pub struct CheckerRegistry {
    checkers: Vec<Box<dyn Checker>>,
}

impl CheckerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a checker.
    pub fn add(&mut self, checker: Box<dyn Checker>) {
        debug!(checker = checker.name(), "registered checker");
        self.checkers.push(checker);
    }

    /// Number of registered checkers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    /// Returns true if no checker is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Names of the registered checkers, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.checkers.iter().map(|c| c.name()).collect()
    }

    /// Runs every checker in registration order and concatenates their
    /// diagnostics. The test passes iff the result is empty.
    ///
    /// # Errors
    ///
    /// Returns the first `CheckError`; later checkers are not run.
    pub async fn check_all(
        &self,
        test: &TestCase,
        response: &ResponseSpec,
    ) -> Result<Vec<Diagnostic>, CheckError> {
        let mut diagnostics = Vec::new();
        for checker in &self.checkers {
            let found = checker.check(test, response).await?;
            if !found.is_empty() {
                debug!(
                    test = %test.name,
                    checker = checker.name(),
                    count = found.len(),
                    "checker reported mismatches"
                );
            }
            diagnostics.extend(found);
        }
        Ok(diagnostics)
    }
}

/// Ordered set of output sinks with an exactly-once finalization guarantee.
///
/// [`OutputRegistry::finalize`] is called at the end of a run. If the
/// registry is dropped first (early return, unwinding, or a runner that was
/// never run) the sinks are finalized on drop instead.
#[derive(Default)]
pub struct OutputRegistry {
    sinks: Vec<Box<dyn OutputSink>>,
    finalized: bool,
}

impl OutputRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sink.
    pub fn add(&mut self, sink: Box<dyn OutputSink>) {
        debug!(sink = sink.name(), "registered output sink");
        self.sinks.push(sink);
    }

    /// Number of registered sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if no sink is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Hands the report to every sink in registration order.
    ///
    /// A panicking sink is logged and skipped; the remaining sinks still
    /// receive the report.
    pub fn dispatch(&mut self, report: &TestReport) {
        for sink in &mut self.sinks {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| sink.receive(report))) {
                error!(
                    sink = sink.name(),
                    test = %report.name,
                    panic = %panic_message(payload.as_ref()),
                    "output sink panicked while receiving a report"
                );
            }
        }
    }

    /// Finalizes every sink once. Later calls do nothing.
    ///
    /// Every sink is finalized even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first sink failure as [`RunError::Finalize`].
    pub fn finalize(&mut self) -> Result<(), RunError> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;

        let mut first = None;
        for sink in &mut self.sinks {
            let result = catch_unwind(AssertUnwindSafe(|| sink.finalize())).unwrap_or_else(
                |payload| Err(SinkError::Panicked(panic_message(payload.as_ref()))),
            );
            match result {
                Ok(()) => debug!(sink = sink.name(), "output sink finalized"),
                Err(source) => {
                    error!(sink = sink.name(), error = %source, "output sink failed to finalize");
                    if first.is_none() {
                        first = Some(RunError::Finalize {
                            sink: sink.name().to_string(),
                            source,
                        });
                    }
                }
            }
        }

        first.map_or(Ok(()), Err)
    }
}

impl Drop for OutputRegistry {
    fn drop(&mut self) {
        if !self.finalized && !self.sinks.is_empty() {
            warn!("output registry dropped before the run finished, finalizing sinks");
            // Errors are already logged by finalize.
            let _ = self.finalize();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
