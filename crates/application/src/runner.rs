//! Run orchestrator
//!
//! The [`Runner`] pulls test cases from a loader, hands each one to the host
//! bridge together with the executor, and fans every outcome out to the
//! output sinks before moving on to the next test case.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gauntlet_domain::{
    Outcome, OutcomeKind, RequestSummary, ResponseSpec, RunSummary, TestCase, TestReport,
};
use parking_lot::Mutex;
use tracing::{error, info, warn};
use url::Url;

use crate::error::{ExecutionError, RunError, RunResult, TestCaseError};
use crate::execution::Execution;
use crate::executor::TestExecutor;
use crate::ports::{
    Checker, ExecuteTest, FixtureLoader, HttpClient, MockServer, OutputSink, TestHandler,
    TestLoader,
};
use crate::registry::{CheckerRegistry, OutputRegistry};

/// Validated settings for one run.
pub struct RunnerConfig {
    /// Base URL every request path is joined onto.
    pub host: Url,
    /// Transport used for every request.
    pub http_client: Arc<dyn HttpClient>,
    /// Fixture loader, if the run has a backing store.
    pub fixtures: Option<Arc<dyn FixtureLoader>>,
    /// Mock server, if the run mocks external services.
    pub mocks: Option<Arc<dyn MockServer>>,
    /// Run-level variables.
    pub variables: BTreeMap<String, String>,
    /// Log full requests and responses.
    pub debug: bool,
}

impl RunnerConfig {
    /// Creates a configuration with no fixtures, mocks or variables.
    #[must_use]
    pub fn new(host: Url, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            host,
            http_client,
            fixtures: None,
            mocks: None,
            variables: BTreeMap::new(),
            debug: false,
        }
    }

    /// Sets the fixture loader (builder pattern).
    #[must_use]
    pub fn with_fixtures(mut self, fixtures: Arc<dyn FixtureLoader>) -> Self {
        self.fixtures = Some(fixtures);
        self
    }

    /// Sets the mock server (builder pattern).
    #[must_use]
    pub fn with_mocks(mut self, mocks: Arc<dyn MockServer>) -> Self {
        self.mocks = Some(mocks);
        self
    }

    /// Sets the run-level variables (builder pattern).
    #[must_use]
    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    /// Enables request/response dumps (builder pattern).
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// The test run orchestrator.
///
/// Registries are filled before [`Runner::run`], which consumes the runner:
/// a runner runs at most once. Sinks are finalized exactly once, either at
/// the end of the run or when an unused runner is dropped.
pub struct Runner {
    config: RunnerConfig,
    loader: Box<dyn TestLoader>,
    handler: Arc<dyn TestHandler>,
    checkers: CheckerRegistry,
    outputs: OutputRegistry,
}

impl Runner {
    /// Creates a runner with empty checker and output registries.
    #[must_use]
    pub fn new(
        config: RunnerConfig,
        loader: Box<dyn TestLoader>,
        handler: Arc<dyn TestHandler>,
    ) -> Self {
        Self {
            config,
            loader,
            handler,
            checkers: CheckerRegistry::new(),
            outputs: OutputRegistry::new(),
        }
    }

    /// Appends checkers, in order.
    pub fn add_checkers(&mut self, checkers: impl IntoIterator<Item = Box<dyn Checker>>) {
        for checker in checkers {
            self.checkers.add(checker);
        }
    }

    /// Appends one checker.
    pub fn add_checker(&mut self, checker: Box<dyn Checker>) {
        self.checkers.add(checker);
    }

    /// Appends an output sink.
    pub fn add_output(&mut self, sink: Box<dyn OutputSink>) {
        self.outputs.add(sink);
    }

    /// Number of registered output sinks.
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Number of registered checkers.
    #[must_use]
    pub fn checker_count(&self) -> usize {
        self.checkers.len()
    }

    /// Runs every loaded test case in loader order.
    ///
    /// A failing test case never stops the run. Each outcome is dispatched to
    /// every sink before the next test case starts.
    ///
    /// # Errors
    ///
    /// In order of priority: the first broken or errored test case, then
    /// [`RunError::AssertionsFailed`] naming the first failed test case, then
    /// a sink finalization failure. A loader failure aborts before any test
    /// case runs, after the sinks are finalized.
    pub async fn run(self) -> RunResult<RunSummary> {
        let Self {
            config,
            loader,
            handler,
            checkers,
            mut outputs,
        } = self;

        if outputs.is_empty() {
            warn!("no output sinks registered, outcomes will only be visible in logs");
        }

        let tests = match loader.load() {
            Ok(tests) => tests,
            Err(err) => {
                error!(error = %err, "failed to load test cases");
                if let Err(finalize) = outputs.finalize() {
                    warn!(error = %finalize, "output sink failed to finalize after load failure");
                }
                return Err(RunError::Load(err));
            }
        };

        let focus_mode = tests.iter().any(TestCase::is_focused);
        if focus_mode {
            info!("focused test cases found, running only those");
        }
        info!(
            tests = tests.len(),
            checkers = checkers.len(),
            outputs = outputs.len(),
            "starting run"
        );

        let executor = TestExecutor::new(config, checkers).with_focus_mode(focus_mode);
        let started = Instant::now();
        let mut summary = RunSummary::default();
        let mut first_error: Option<TestCaseError> = None;
        let mut first_failure: Option<String> = None;

        for test in &tests {
            let recorder = RecordingExecutor::new(&executor);
            let started_at = Utc::now();
            let clock = Instant::now();

            let mut handled = handler.handle_test(test, &recorder).await;
            let (report, executed) = recorder.into_report(test, started_at, clock.elapsed());
            if !executed && handled.is_ok() {
                handled = Err(TestCaseError::Broken {
                    test: test.name.clone(),
                    cause: ExecutionError::NotExecuted,
                });
            }

            summary.record(report.kind());
            if report.kind() == OutcomeKind::Failed && first_failure.is_none() {
                first_failure = Some(test.name.clone());
            }
            outputs.dispatch(&report);

            if let Err(err) = handled {
                warn!(test = %test.name, error = %err, "test case did not complete");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        summary.duration = started.elapsed();
        info!(%summary, "run finished");
        let finalized = outputs.finalize();

        if let Some(err) = first_error {
            return Err(RunError::TestCase(err));
        }
        if let Some(first) = first_failure {
            return Err(RunError::AssertionsFailed { first, summary });
        }
        finalized.map(|()| summary)
    }
}

/// What the orchestrator keeps from one execution for its report.
struct Recorded {
    outcome: Outcome,
    request: Option<RequestSummary>,
    response: Option<ResponseSpec>,
}

/// Wraps the executor handed to the host bridge so the orchestrator can
/// build the report after the bridge returns.
struct RecordingExecutor<'a> {
    inner: &'a TestExecutor,
    slot: Mutex<Option<Recorded>>,
}

impl<'a> RecordingExecutor<'a> {
    fn new(inner: &'a TestExecutor) -> Self {
        Self {
            inner,
            slot: Mutex::new(None),
        }
    }

    /// Builds the report for the test case. The flag is false if the host
    /// bridge never invoked the executor.
    fn into_report(
        self,
        test: &TestCase,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> (TestReport, bool) {
        let recorded = self.slot.into_inner();
        let executed = recorded.is_some();
        let recorded = recorded.unwrap_or_else(|| {
            warn!(test = %test.name, "host bridge returned without executing the test");
            Recorded {
                outcome: Outcome::Broken {
                    cause: ExecutionError::NotExecuted.to_string(),
                },
                request: None,
                response: None,
            }
        });

        let report = TestReport {
            name: test.name.clone(),
            file: test.file.clone(),
            outcome: recorded.outcome,
            started_at,
            duration,
            request: recorded.request,
            response: recorded.response,
        };
        (report, executed)
    }
}

#[async_trait]
impl<'a> ExecuteTest for RecordingExecutor<'a> {
    async fn execute(&self, test: &TestCase) -> Execution {
        let execution = self.inner.execute(test).await;
        let recorded = Recorded {
            outcome: execution.outcome(),
            request: execution.result().map(|r| r.request.clone()),
            response: execution.result().map(|r| r.response.clone()),
        };
        if self.slot.lock().replace(recorded).is_some() {
            warn!(test = %test.name, "executor invoked more than once, keeping the last outcome");
        }
        execution
    }
}
