//! Response header checker

use async_trait::async_trait;
use gauntlet_application::ports::{CheckError, Checker};
use gauntlet_domain::{Diagnostic, ResponseSpec, TestCase};

use super::compare::matches_text;

const NAME: &str = "headers";

/// Checks that every expected header is present with the expected value.
///
/// Header names are case-insensitive. A value written as
/// `$matchRegexp(<re>)` is matched as a regex.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderChecker;

impl HeaderChecker {
    /// Creates a new header checker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Checker for HeaderChecker {
    fn name(&self) -> &str {
        NAME
    }

    async fn check(
        &self,
        test: &TestCase,
        response: &ResponseSpec,
    ) -> Result<Vec<Diagnostic>, CheckError> {
        let mut diagnostics = Vec::new();
        for (name, expected) in &test.expect.headers {
            let Some(actual) = response.get_header(name) else {
                diagnostics.push(Diagnostic::at(NAME, name.clone(), "header is missing"));
                continue;
            };
            let matched = matches_text(expected, actual).map_err(|e| {
                CheckError::new(NAME, format!("invalid regex for header `{name}`: {e}"))
            })?;
            if !matched {
                diagnostics.push(Diagnostic::at(
                    NAME,
                    name.clone(),
                    format!("expected {expected:?}, got {actual:?}"),
                ));
            }
        }
        Ok(diagnostics)
    }
}
