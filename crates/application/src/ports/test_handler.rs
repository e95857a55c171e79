//! Host bridge port
//!
//! The orchestrator never talks to a host reporting framework directly. For
//! every test case it calls [`TestHandler::handle_test`], handing over an
//! [`ExecuteTest`] callback that the handler must invoke exactly once.

use async_trait::async_trait;
use gauntlet_domain::TestCase;

use crate::error::TestCaseError;
use crate::execution::Execution;

/// Executes one test case. Provided by the orchestrator to the host bridge.
#[async_trait]
pub trait ExecuteTest: Send + Sync {
    /// Runs the test case and classifies how it concluded.
    async fn execute(&self, test: &TestCase) -> Execution;
}

/// Bridges one test case into a host reporting framework.
///
/// The handler creates whatever named sub-unit the host provides, invokes
/// the executor once, signals pass/fail/skip/error into the host and returns
/// an error only for broken or fatal executions.
#[async_trait]
pub trait TestHandler: Send + Sync {
    /// Handles a single test case.
    ///
    /// # Errors
    ///
    /// Returns `TestCaseError` when the execution was broken or fatal.
    async fn handle_test(
        &self,
        test: &TestCase,
        executor: &dyn ExecuteTest,
    ) -> Result<(), TestCaseError>;
}
