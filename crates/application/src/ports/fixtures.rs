//! Fixture loading port

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while seeding fixtures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FixtureError {
    /// No fixture with this name exists.
    #[error("fixture `{0}` not found")]
    NotFound(String),

    /// The fixture exists but could not be loaded into the backing store.
    #[error("failed to load fixture `{fixture}`: {message}")]
    Load {
        /// Fixture name.
        fixture: String,
        /// Underlying error.
        message: String,
    },
}

/// Seeds a backing store before a test case runs.
///
/// Implementations are responsible for resetting whatever state the named
/// fixtures cover; the orchestrator does no transactional isolation.
#[async_trait]
pub trait FixtureLoader: Send + Sync {
    /// Loads the named fixture sets, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if any fixture is missing or cannot be applied.
    async fn load(&self, fixtures: &[String]) -> Result<(), FixtureError>;
}
