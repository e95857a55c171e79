//! Status and response body checker

use async_trait::async_trait;
use gauntlet_application::ports::{CheckError, Checker};
use gauntlet_domain::{Diagnostic, ResponseSpec, TestCase};

use super::compare::{compare_json, matches_text, regex_marker};

const NAME: &str = "body";
const PREVIEW: usize = 200;

/// Checks the expected status code and the expected body.
///
/// JSON bodies are compared structurally using the test's compare options.
/// Any other expected body is compared as text, or as a regex when written
/// as `$matchRegexp(<re>)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BodyChecker;

impl BodyChecker {
    /// Creates a new body checker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn check_text(expected: &str, response: &ResponseSpec) -> Result<Vec<Diagnostic>, CheckError> {
        let matched = matches_text(expected, &response.body)
            .map_err(|e| CheckError::new(NAME, format!("invalid expected body regex: {e}")))?;
        if matched {
            return Ok(Vec::new());
        }
        let message = match regex_marker(expected) {
            Some(pattern) => format!(
                "body does not match /{pattern}/: {}",
                response.body_preview(PREVIEW)
            ),
            None => format!(
                "expected body {expected:?}, got {:?}",
                response.body_preview(PREVIEW)
            ),
        };
        Ok(vec![Diagnostic::new(NAME, message)])
    }
}

#[async_trait]
impl Checker for BodyChecker {
    fn name(&self) -> &str {
        NAME
    }

    async fn check(
        &self,
        test: &TestCase,
        response: &ResponseSpec,
    ) -> Result<Vec<Diagnostic>, CheckError> {
        let mut diagnostics = Vec::new();

        if let Some(expected) = &test.expect.status
            && !expected.matches(response.status)
        {
            diagnostics.push(Diagnostic::at(
                NAME,
                "status",
                format!(
                    "server responded with status {}, expected {expected}",
                    response.status_code()
                ),
            ));
        }

        let Some(expected) = &test.expect.body else {
            return Ok(diagnostics);
        };

        match serde_json::from_str::<serde_json::Value>(expected) {
            Ok(expected_json) => match response.body_as_json() {
                Some(actual) => diagnostics.extend(compare_json(
                    NAME,
                    &expected_json,
                    &actual,
                    test.expect.compare,
                )),
                None => diagnostics.push(Diagnostic::new(
                    NAME,
                    format!(
                        "expected a JSON body, got {:?}",
                        response.body_preview(PREVIEW)
                    ),
                )),
            },
            Err(_) => diagnostics.extend(Self::check_text(expected, response)?),
        }

        Ok(diagnostics)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::time::Duration;

    use gauntlet_domain::{Expectations, RequestSpec, StatusExpectation};
    use pretty_assertions::assert_eq;

    fn response(status: u16, body: &str) -> ResponseSpec {
        ResponseSpec::new(status, BTreeMap::new(), body.as_bytes(), Duration::ZERO)
    }

    fn test_expecting(status: Option<u16>, body: Option<&str>) -> TestCase {
        TestCase::new("t", RequestSpec::get("/")).with_expect(Expectations {
            status: status.map(StatusExpectation::Exact),
            body: body.map(ToString::to_string),
            ..Expectations::default()
        })
    }

    #[tokio::test]
    async fn test_matching_status_and_json_body() {
        let test = test_expecting(Some(200), Some(r#"{"id": 1}"#));
        let diagnostics = BodyChecker
            .check(&test, &response(200, r#"{"id": 1, "name": "ada"}"#))
            .await
            .unwrap();
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_status_mismatch() {
        let test = test_expecting(Some(201), None);
        let diagnostics = BodyChecker.check(&test, &response(500, "")).await.unwrap();
        assert_eq!(
            diagnostics,
            vec![Diagnostic::at(
                "body",
                "status",
                "server responded with status 500 Internal Server Error, expected = 201"
            )]
        );
    }

    #[tokio::test]
    async fn test_json_expected_but_text_received() {
        let test = test_expecting(None, Some(r#"{"id": 1}"#));
        let diagnostics = BodyChecker
            .check(&test, &response(200, "not json"))
            .await
            .unwrap();
        assert_eq!(
            diagnostics,
            vec![Diagnostic::new("body", r#"expected a JSON body, got "not json""#)]
        );
    }

    #[tokio::test]
    async fn test_text_body_and_regex() {
        let exact = test_expecting(None, Some("pong"));
        assert!(BodyChecker.check(&exact, &response(200, "pong")).await.unwrap().is_empty());
        assert_eq!(
            BodyChecker.check(&exact, &response(200, "ping")).await.unwrap().len(),
            1
        );

        let regex = test_expecting(None, Some("$matchRegexp(^ok-[0-9]+$)"));
        assert!(BodyChecker.check(&regex, &response(200, "ok-12")).await.unwrap().is_empty());

        let invalid = test_expecting(None, Some("$matchRegexp(()"));
        assert!(BodyChecker.check(&invalid, &response(200, "x")).await.is_err());
    }
}
