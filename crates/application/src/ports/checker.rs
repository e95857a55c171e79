//! Checker port

use async_trait::async_trait;
use gauntlet_domain::{Diagnostic, ResponseSpec, TestCase};
use thiserror::Error;

/// A checker could not evaluate its expectations at all.
///
/// This is different from a mismatch: mismatches are returned as
/// [`Diagnostic`]s, while this error aborts the test case.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("checker `{checker}` failed: {message}")]
pub struct CheckError {
    /// Name of the failing checker.
    pub checker: String,
    /// What went wrong.
    pub message: String,
}

impl CheckError {
    /// Creates a new check error.
    pub fn new(checker: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            checker: checker.into(),
            message: message.into(),
        }
    }
}

/// A pluggable verification strategy.
///
/// Checkers are invoked once per executed test case, in registration order.
/// They must only read the test case and the response; the orchestrator does
/// not serialize them against any shared state.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Short name used to tag diagnostics.
    fn name(&self) -> &str;

    /// Compares the actual response against the test case's expectations.
    ///
    /// Returns zero or more mismatches, in a deterministic order.
    ///
    /// # Errors
    ///
    /// Returns `CheckError` if the expectations could not be evaluated.
    async fn check(
        &self,
        test: &TestCase,
        response: &ResponseSpec,
    ) -> Result<Vec<Diagnostic>, CheckError>;
}
