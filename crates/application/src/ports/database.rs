//! Database port

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a database connection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DatabaseError {
    /// The connection is unusable.
    #[error("database connection error: {0}")]
    Connection(String),

    /// A query failed.
    #[error("query `{query}` failed: {message}")]
    Query {
        /// The failing query.
        query: String,
        /// Driver message.
        message: String,
    },
}

/// Read access to the database behind the system under test.
#[async_trait]
pub trait Database: Send + Sync {
    /// Runs a query and returns each row as a JSON object keyed by column.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be executed.
    async fn query(&self, sql: &str) -> Result<Vec<serde_json::Value>, DatabaseError>;
}
