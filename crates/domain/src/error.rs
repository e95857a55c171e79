//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A test case is missing its human-readable name.
    #[error("test case has an empty name")]
    EmptyTestName,

    /// A test case definition is structurally invalid.
    #[error("invalid test case `{name}`: {reason}")]
    InvalidTestCase {
        /// Name of the offending test case.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
