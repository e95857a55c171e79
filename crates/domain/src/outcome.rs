//! Outcome model
//!
//! Every executed test case concludes with exactly one [`Outcome`]. Outcomes
//! are wrapped in a [`TestReport`] and handed to every output sink; neither is
//! mutated afterwards.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::HttpMethod;
use crate::response::ResponseSpec;

/// A single mismatch reported by a checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Name of the checker that produced it.
    pub checker: String,
    /// Location inside the checked value (e.g. `$.data[0].id`), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Human-readable description of the mismatch.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic without a path.
    #[must_use]
    pub fn new(checker: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            checker: checker.into(),
            path: None,
            message: message.into(),
        }
    }

    /// Creates a diagnostic anchored at a path.
    #[must_use]
    pub fn at(
        checker: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            checker: checker.into(),
            path: Some(path.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[{}] {}: {}", self.checker, path, self.message),
            None => write!(f, "[{}] {}", self.checker, self.message),
        }
    }
}

/// Kind of an [`Outcome`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// All checkers succeeded.
    Passed,
    /// At least one checker reported a mismatch.
    Failed,
    /// The test was intentionally not executed.
    Skipped,
    /// The test could not be brought to a checkable state.
    Broken,
}

impl OutcomeKind {
    /// Upper-case label used in console output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Skipped => "SKIP",
            Self::Broken => "BROKEN",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Broken => "broken",
        };
        f.write_str(name)
    }
}

/// How a single test case concluded.
///
/// `Failed` (the system under test misbehaved) and `Broken` (the rig could
/// not run the test) are deliberately distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// All checkers succeeded.
    Passed,
    /// Checker mismatches, in checker registration order.
    Failed {
        /// The mismatches.
        diagnostics: Vec<Diagnostic>,
    },
    /// Not executed.
    Skipped {
        /// Why the test was skipped.
        reason: String,
    },
    /// Environment or setup failure before the assertion stage.
    Broken {
        /// What went wrong.
        cause: String,
    },
}

impl Outcome {
    /// Returns the kind of this outcome.
    #[must_use]
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::Passed => OutcomeKind::Passed,
            Self::Failed { .. } => OutcomeKind::Failed,
            Self::Skipped { .. } => OutcomeKind::Skipped,
            Self::Broken { .. } => OutcomeKind::Broken,
        }
    }

    /// Classifies a completed execution by its diagnostics.
    #[must_use]
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        if diagnostics.is_empty() {
            Self::Passed
        } else {
            Self::Failed { diagnostics }
        }
    }

    /// Returns the diagnostics of a failed outcome (empty otherwise).
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Failed { diagnostics } => diagnostics,
            _ => &[],
        }
    }

    /// One-line explanation for non-passing outcomes.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Passed => None,
            Self::Failed { diagnostics } => Some(
                diagnostics
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Self::Skipped { reason } => Some(reason.clone()),
            Self::Broken { cause } => Some(cause.clone()),
        }
    }
}

/// Method and resolved URL of the request a test sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSummary {
    /// HTTP method.
    pub method: HttpMethod,
    /// Fully resolved URL.
    pub url: String,
}

/// Everything an output sink learns about one executed test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    /// Test case name.
    pub name: String,
    /// Source file of the test case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// How the test concluded.
    pub outcome: Outcome,
    /// When execution started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock execution time.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    /// The request sent, if the test got that far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestSummary>,
    /// The response received, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSpec>,
}

impl TestReport {
    /// Returns the kind of the outcome.
    #[must_use]
    pub const fn kind(&self) -> OutcomeKind {
        self.outcome.kind()
    }

    /// Returns when execution finished.
    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.started_at
            + chrono::Duration::from_std(self.duration).unwrap_or_else(|_| chrono::Duration::zero())
    }
}

/// Aggregate counts for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of test cases processed.
    pub total: usize,
    /// Passed test cases.
    pub passed: usize,
    /// Failed test cases.
    pub failed: usize,
    /// Skipped test cases.
    pub skipped: usize,
    /// Broken test cases.
    pub broken: usize,
    /// Total wall-clock time.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl RunSummary {
    /// Counts one outcome.
    pub const fn record(&mut self, kind: OutcomeKind) {
        self.total += 1;
        match kind {
            OutcomeKind::Passed => self.passed += 1,
            OutcomeKind::Failed => self.failed += 1,
            OutcomeKind::Skipped => self.skipped += 1,
            OutcomeKind::Broken => self.broken += 1,
        }
    }

    /// Returns true when nothing failed or broke. Skips do not count against a run.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0 && self.broken == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} total, {} passed, {} failed, {} skipped, {} broken in {:.2?}",
            self.total, self.passed, self.failed, self.skipped, self.broken, self.duration
        )
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
