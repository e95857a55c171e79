//! Mock server port

use std::collections::BTreeMap;

use async_trait::async_trait;
use gauntlet_domain::Diagnostic;
use thiserror::Error;

/// Errors raised while preparing upstream mocks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MockError {
    /// The test names a mocked service that does not exist.
    #[error("unknown mocked service `{0}`")]
    UnknownService(String),

    /// A mock definition could not be applied.
    #[error("invalid mock definition for `{service}`: {message}")]
    InvalidDefinition {
        /// Mocked service name.
        service: String,
        /// What is wrong.
        message: String,
    },
}

/// Upstream HTTP dependencies mocked for the system under test.
#[async_trait]
pub trait MockServer: Send + Sync {
    /// Replaces the current mock behaviour with the test's definitions.
    ///
    /// `{{ var }}` placeholders in string values are already substituted.
    ///
    /// # Errors
    ///
    /// Returns an error if a definition cannot be applied.
    async fn prepare(
        &self,
        definitions: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), MockError>;

    /// Reports expectations that were not met by the time the response arrived.
    async fn verify(&self) -> Vec<Diagnostic>;
}
