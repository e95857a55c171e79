//! Execution results
//!
//! The executor reports how a test case concluded through the [`Execution`]
//! sum type rather than through a generic error channel, so skip, broken and
//! fatal conditions can never be confused with each other.

use gauntlet_domain::{Diagnostic, Outcome, RequestSummary, ResponseSpec};

use crate::error::ExecutionError;

/// Data gathered from a test case that reached the assertion stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// The request that was sent.
    pub request: RequestSummary,
    /// The response that came back.
    pub response: ResponseSpec,
    /// Checker diagnostics, in checker registration order.
    pub diagnostics: Vec<Diagnostic>,
}

impl ExecutionResult {
    /// A test case passes iff no checker reported a mismatch.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// How one test case concluded.
#[derive(Debug)]
pub enum Execution {
    /// Every checker succeeded.
    Passed(ExecutionResult),
    /// At least one checker reported a mismatch.
    Failed(ExecutionResult),
    /// The test case was intentionally not executed.
    Skipped {
        /// Why.
        reason: String,
    },
    /// The environment prevented the test from reaching the assertion stage.
    Broken {
        /// What went wrong.
        cause: ExecutionError,
    },
    /// Any other unrecoverable per-test error.
    Fatal {
        /// The error.
        error: ExecutionError,
    },
}

impl Execution {
    /// Classifies a completed execution as passed or failed.
    #[must_use]
    pub fn completed(result: ExecutionResult) -> Self {
        if result.passed() {
            Self::Passed(result)
        } else {
            Self::Failed(result)
        }
    }

    /// Creates a skipped execution.
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// Returns the result if the test reached the assertion stage.
    #[must_use]
    pub const fn result(&self) -> Option<&ExecutionResult> {
        match self {
            Self::Passed(result) | Self::Failed(result) => Some(result),
            _ => None,
        }
    }

    /// Converts the execution into the outcome reported to output sinks.
    ///
    /// Fatal executions never reached a checkable state and are reported as
    /// broken.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Passed(_) => Outcome::Passed,
            Self::Failed(result) => Outcome::Failed {
                diagnostics: result.diagnostics.clone(),
            },
            Self::Skipped { reason } => Outcome::Skipped {
                reason: reason.clone(),
            },
            Self::Broken { cause } => Outcome::Broken {
                cause: cause.to_string(),
            },
            Self::Fatal { error } => Outcome::Broken {
                cause: error.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_domain::{HttpMethod, OutcomeKind};
    use pretty_assertions::assert_eq;

    fn result(diagnostics: Vec<Diagnostic>) -> ExecutionResult {
        ExecutionResult {
            request: RequestSummary {
                method: HttpMethod::Get,
                url: "http://localhost/users".to_string(),
            },
            response: ResponseSpec::default(),
            diagnostics,
        }
    }

    #[test]
    fn test_completed_classifies_by_diagnostics() {
        assert!(matches!(
            Execution::completed(result(Vec::new())),
            Execution::Passed(_)
        ));
        let failed = Execution::completed(result(vec![Diagnostic::new("body", "mismatch")]));
        assert!(matches!(failed, Execution::Failed(_)));
        assert_eq!(failed.outcome().kind(), OutcomeKind::Failed);
    }

    #[test]
    fn test_fatal_is_reported_as_broken() {
        let fatal = Execution::Fatal {
            error: ExecutionError::InvalidRequest("bad url".to_string()),
        };
        assert_eq!(
            fatal.outcome(),
            Outcome::Broken {
                cause: "invalid request: bad url".to_string()
            }
        );
        assert!(fatal.result().is_none());
    }

    #[test]
    fn test_skipped_outcome_keeps_reason() {
        assert_eq!(
            Execution::skipped("not focused").outcome(),
            Outcome::Skipped {
                reason: "not focused".to_string()
            }
        );
    }
}
