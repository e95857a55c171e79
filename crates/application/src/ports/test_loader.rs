//! Test loader port

use std::path::PathBuf;

use gauntlet_domain::{DomainError, TestCase};
use thiserror::Error;

/// Errors raised while loading test case definitions.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The tests location does not exist.
    #[error("tests location not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A file could not be parsed.
    #[error("failed to parse {}: {message}", .path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A test case violates a definition invariant.
    #[error("invalid test case in {}: {source}", .path.display())]
    Invalid {
        /// Offending file.
        path: PathBuf,
        /// Violated invariant.
        source: DomainError,
    },
}

/// Produces the ordered sequence of test cases for a run.
pub trait TestLoader: Send + Sync {
    /// Loads every test case, in execution order.
    ///
    /// # Errors
    ///
    /// Returns an error if any definition cannot be read, parsed or validated.
    fn load(&self) -> Result<Vec<TestCase>, LoaderError>;
}
