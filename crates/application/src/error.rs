//! Application error types

use gauntlet_domain::RunSummary;
use thiserror::Error;

use crate::ports::{
    CheckError, FixtureError, HttpClientError, LoaderError, MockError, SinkError,
};

/// Why a single test case could not produce a pass/fail verdict.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The definition declares the test as broken.
    #[error("test is marked as broken")]
    MarkedBroken,

    /// The test needs fixtures but the run has no fixture loader.
    #[error("test requires fixtures {0:?} but no fixture loader is configured")]
    NoFixtureLoader(Vec<String>),

    /// Fixtures could not be loaded.
    #[error(transparent)]
    Fixtures(#[from] FixtureError),

    /// The test declares mocks but the run has no mock server.
    #[error("test declares mocks but no mock server is configured")]
    NoMockServer,

    /// Mocks could not be prepared.
    #[error(transparent)]
    Mocks(#[from] MockError),

    /// The request could not be sent or no response arrived.
    #[error(transparent)]
    Http(#[from] HttpClientError),

    /// The request described by the test case is invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A checker could not evaluate its expectations.
    #[error(transparent)]
    Check(#[from] CheckError),

    /// The host bridge returned without invoking the executor.
    #[error("host bridge did not execute the test")]
    NotExecuted,
}

/// Error a host bridge returns for one test case.
#[derive(Debug, Error)]
pub enum TestCaseError {
    /// The test rig could not run the test case.
    #[error("test `{test}` is broken: {cause}")]
    Broken {
        /// Test case name.
        test: String,
        /// Environment or setup failure.
        cause: ExecutionError,
    },

    /// The test case aborted with an unrecoverable error.
    #[error("test `{test}` errored: {error}")]
    Fatal {
        /// Test case name.
        test: String,
        /// The error.
        error: ExecutionError,
    },
}

impl TestCaseError {
    /// Name of the test case the error belongs to.
    #[must_use]
    pub fn test(&self) -> &str {
        match self {
            Self::Broken { test, .. } | Self::Fatal { test, .. } => test,
        }
    }
}

/// Terminal error of a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Test cases could not be loaded; nothing was executed.
    #[error("failed to load test cases: {0}")]
    Load(#[from] LoaderError),

    /// A test case was broken or errored. The first one is reported.
    #[error(transparent)]
    TestCase(#[from] TestCaseError),

    /// Every test case ran, but some assertions failed.
    #[error("{} of {} test case(s) failed, first failure: `{first}`", .summary.failed, .summary.total)]
    AssertionsFailed {
        /// Name of the first failed test case.
        first: String,
        /// Counts for the run.
        summary: RunSummary,
    },

    /// An output sink could not be finalized after an otherwise clean run.
    #[error("output `{sink}` failed to finalize: {source}")]
    Finalize {
        /// Sink name.
        sink: String,
        /// Underlying error.
        source: SinkError,
    },
}

impl RunError {
    /// Returns true if the run could not reliably execute, as opposed to the
    /// system under test failing assertions.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        !matches!(self, Self::AssertionsFailed { .. })
    }
}

/// Result type alias for a run.
pub type RunResult<T> = Result<T, RunError>;
