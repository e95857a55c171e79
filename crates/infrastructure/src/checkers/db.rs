//! Database state checker

use std::sync::Arc;

use async_trait::async_trait;
use gauntlet_application::ports::{CheckError, Checker, Database};
use gauntlet_domain::{Diagnostic, ResponseSpec, TestCase};
use serde_json::Value;

use super::compare::compare_json;

const NAME: &str = "database";

/// Runs each `db_checks` query and compares the returned rows with the
/// expected rows.
///
/// Only registered when the run has a database connection.
pub struct DbChecker {
    database: Arc<dyn Database>,
}

impl DbChecker {
    /// Creates a checker querying `database`.
    #[must_use]
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Checker for DbChecker {
    fn name(&self) -> &str {
        NAME
    }

    async fn check(
        &self,
        test: &TestCase,
        _response: &ResponseSpec,
    ) -> Result<Vec<Diagnostic>, CheckError> {
        let mut diagnostics = Vec::new();
        for (i, check) in test.db_checks.iter().enumerate() {
            let rows = self
                .database
                .query(&check.query)
                .await
                .map_err(|e| CheckError::new(NAME, e.to_string()))?;

            let found = compare_json(
                NAME,
                &Value::Array(check.rows.clone()),
                &Value::Array(rows),
                check.compare,
            );
            // `$` becomes `db_checks[i]`.
            diagnostics.extend(found.into_iter().map(|mut d| {
                d.path = d
                    .path
                    .map(|p| p.replacen('$', &format!("db_checks[{i}]"), 1));
                d
            }));
        }
        Ok(diagnostics)
    }
}
