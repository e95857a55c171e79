//! Built-in host bridge
//!
//! [`TestingHandler`] plays the role of a host test framework: every test
//! case becomes a named sub-run with its own tracing span, and the handler
//! keeps the verdict the host would show for it.

use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use gauntlet_application::ports::{ExecuteTest, TestHandler};
use gauntlet_application::{Execution, TestCaseError};
use gauntlet_domain::TestCase;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{Instrument, debug, info_span};

/// Verdict of one sub-run as the host sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubRunStatus {
    /// The test case passed.
    Passed,
    /// The test case ran and its checks failed.
    Failed,
    /// The test case was skipped.
    Skipped,
    /// The test case could not be evaluated.
    Errored,
}

impl fmt::Display for SubRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// A named sub-run created for one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubRun {
    /// Unique sub-run name. Repeated test names get a `#NN` suffix.
    pub name: String,
    /// Host verdict.
    pub status: SubRunStatus,
}

#[derive(Debug, Default)]
struct State {
    counters: HashMap<String, usize>,
    used: HashSet<String>,
    sub_runs: Vec<SubRun>,
}

impl State {
    /// Returns `name`, or the first `name#NN` not handed out yet.
    fn unique_name(&mut self, name: &str) -> String {
        let count = self.counters.entry(name.to_string()).or_insert(0);
        let mut unique = if *count == 0 {
            name.to_string()
        } else {
            format!("{name}#{count:02}")
        };
        while self.used.contains(&unique) {
            *count += 1;
            unique = format!("{name}#{count:02}");
        }
        *count += 1;
        self.used.insert(unique.clone());
        unique
    }
}

/// Host bridge that records sub-runs in memory.
#[derive(Debug, Default)]
pub struct TestingHandler {
    state: Mutex<State>,
}

impl TestingHandler {
    /// Creates a handler with no recorded sub-runs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sub-runs recorded so far, in execution order.
    #[must_use]
    pub fn sub_runs(&self) -> Vec<SubRun> {
        self.state.lock().sub_runs.clone()
    }

    fn record(&self, name: String, status: SubRunStatus) {
        self.state.lock().sub_runs.push(SubRun { name, status });
    }
}

#[async_trait]
impl TestHandler for TestingHandler {
    async fn handle_test(
        &self,
        test: &TestCase,
        executor: &dyn ExecuteTest,
    ) -> Result<(), TestCaseError> {
        let name = self.state.lock().unique_name(&test.name);
        let span = info_span!("sub_run", test = %name);

        let execution = executor.execute(test).instrument(span.clone()).await;
        let _entered = span.enter();

        let (status, result) = match execution {
            Execution::Skipped { reason } => {
                debug!(%reason, "skipped");
                (SubRunStatus::Skipped, Ok(()))
            }
            Execution::Passed(_) => (SubRunStatus::Passed, Ok(())),
            Execution::Failed(result) => {
                for diagnostic in &result.diagnostics {
                    debug!(%diagnostic, "check failed");
                }
                (SubRunStatus::Failed, Ok(()))
            }
            Execution::Broken { cause } => (
                SubRunStatus::Errored,
                Err(TestCaseError::Broken {
                    test: test.name.clone(),
                    cause,
                }),
            ),
            Execution::Fatal { error } => (
                SubRunStatus::Errored,
                Err(TestCaseError::Fatal {
                    test: test.name.clone(),
                    error,
                }),
            ),
        };

        debug!(%status, "sub-run finished");
        self.record(name, status);
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gauntlet_application::ExecutionError;
    use gauntlet_domain::{RequestSpec, TestStatus};
    use pretty_assertions::assert_eq;

    struct Fixed(fn() -> Execution);

    #[async_trait]
    impl ExecuteTest for Fixed {
        async fn execute(&self, _test: &TestCase) -> Execution {
            (self.0)()
        }
    }

    fn case(name: &str) -> TestCase {
        TestCase::new(name, RequestSpec::get("/health"))
    }

    #[tokio::test]
    async fn test_repeated_names_get_suffix() {
        let handler = TestingHandler::new();
        let exec = Fixed(|| Execution::skipped("not focused"));

        for _ in 0..3 {
            handler.handle_test(&case("login"), &exec).await.ok();
        }
        handler.handle_test(&case("logout"), &exec).await.ok();

        let names: Vec<_> = handler.sub_runs().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["login", "login#01", "login#02", "logout"]);
    }

    #[tokio::test]
    async fn test_generated_names_skip_literal_names() {
        let handler = TestingHandler::new();
        let exec = Fixed(|| Execution::skipped("not focused"));

        for name in ["login#01", "login", "login", "login"] {
            handler.handle_test(&case(name), &exec).await.ok();
        }

        let names: Vec<_> = handler.sub_runs().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["login#01", "login", "login#02", "login#03"]);
    }

    #[tokio::test]
    async fn test_broken_execution_is_errored() {
        let handler = TestingHandler::new();
        let exec = Fixed(|| Execution::Broken {
            cause: ExecutionError::MarkedBroken,
        });

        let mut test = case("flaky");
        test.status = TestStatus::Broken;
        let err = handler.handle_test(&test, &exec).await.unwrap_err();

        assert_eq!(err.test(), "flaky");
        assert!(matches!(err, TestCaseError::Broken { .. }));
        assert_eq!(handler.sub_runs()[0].status, SubRunStatus::Errored);
    }

    #[tokio::test]
    async fn test_skipped_execution_is_ok() {
        let handler = TestingHandler::new();
        let exec = Fixed(|| Execution::skipped("test is marked as skipped"));

        handler.handle_test(&case("later"), &exec).await.unwrap();
        assert_eq!(
            handler.sub_runs(),
            vec![SubRun {
                name: "later".to_string(),
                status: SubRunStatus::Skipped,
            }]
        );
    }
}
