//! Typed assertion checker
//!
//! Evaluates the `assertions` list of a test case. Each failing assertion
//! yields one diagnostic; a malformed assertion (bad regex or JSON path)
//! aborts the check.

use async_trait::async_trait;
use gauntlet_application::json_path;
use gauntlet_application::ports::{CheckError, Checker};
use gauntlet_domain::{Assertion, ComparisonOperator, Diagnostic, ResponseSpec, TestCase};
use regex::Regex;
use serde_json::Value;

const NAME: &str = "assertions";
const PREVIEW: usize = 100;

/// Evaluates typed assertions against the response.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssertionChecker;

impl AssertionChecker {
    /// Creates a new assertion checker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluates one assertion. `Ok(None)` means it holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the assertion itself is malformed.
    pub fn evaluate(
        assertion: &Assertion,
        response: &ResponseSpec,
    ) -> Result<Option<Diagnostic>, CheckError> {
        let failure = match assertion {
            Assertion::StatusCode { expected } => (!expected.matches(response.status))
                .then(|| format!("expected status {expected}, got {}", response.status)),
            Assertion::ResponseTime { max_ms } => {
                let actual_ms = u64::try_from(response.duration.as_millis()).unwrap_or(u64::MAX);
                (actual_ms > *max_ms)
                    .then(|| format!("response took {actual_ms}ms, expected <= {max_ms}ms"))
            }
            Assertion::HeaderExists { name, value } => match (response.get_header(name), value) {
                (None, _) => Some(format!("header '{name}' not found")),
                (Some(actual), Some(expected)) if actual != expected => Some(format!(
                    "header '{name}' is '{actual}', expected '{expected}'"
                )),
                _ => None,
            },
            Assertion::HeaderMatches { name, pattern } => match response.get_header(name) {
                None => Some(format!("header '{name}' not found")),
                Some(actual) => (!compile(pattern)?.is_match(actual))
                    .then(|| format!("header '{name}' value '{actual}' does not match /{pattern}/")),
            },
            Assertion::BodyContains { text, ignore_case } => {
                let contains = if *ignore_case {
                    response.body.to_lowercase().contains(&text.to_lowercase())
                } else {
                    response.body.contains(text.as_str())
                };
                (!contains).then(|| {
                    format!(
                        "body does not contain '{text}': {}",
                        response.body_preview(PREVIEW)
                    )
                })
            }
            Assertion::BodyMatches { pattern } => (!compile(pattern)?.is_match(&response.body))
                .then(|| {
                    format!(
                        "body does not match /{pattern}/: {}",
                        response.body_preview(PREVIEW)
                    )
                }),
            Assertion::JsonPath { path, expected } => {
                return Ok(Self::json_path(response, path, |actual| match expected {
                    Some(expected) if actual != expected => {
                        Some(format!("expected {expected}, got {actual}"))
                    }
                    _ => None,
                })?
                .map(|message| Diagnostic::at(NAME, path.clone(), message)));
            }
            Assertion::JsonPathMatches {
                path,
                operator,
                value,
            } => {
                let failure = Self::json_path(response, path, |actual| {
                    (!compare_values(actual, *operator, value))
                        .then(|| format!("{actual} {operator} {value} does not hold"))
                })?;
                return Ok(failure.map(|message| Diagnostic::at(NAME, path.clone(), message)));
            }
            Assertion::BodyEquals { expected } => (response.body != *expected).then(|| {
                format!(
                    "body does not equal expected value: {}",
                    response.body_preview(PREVIEW)
                )
            }),
            Assertion::IsJson => serde_json::from_str::<Value>(&response.body)
                .err()
                .map(|e| format!("body is not valid JSON: {e}")),
            Assertion::IsXml => (!looks_like_xml(&response.body))
                .then(|| "body does not appear to be valid XML".to_string()),
            Assertion::ContentType { expected } => match response.content_type() {
                None => Some("no Content-Type header present".to_string()),
                Some(actual) => (!actual.contains(expected.as_str()))
                    .then(|| format!("Content-Type '{actual}' does not contain '{expected}'")),
            },
            Assertion::BodyLength { operator, length } => {
                let actual = response.body.len();
                let holds = match operator {
                    ComparisonOperator::Equals => actual == *length,
                    ComparisonOperator::NotEquals => actual != *length,
                    ComparisonOperator::GreaterThan => actual > *length,
                    ComparisonOperator::GreaterThanOrEqual => actual >= *length,
                    ComparisonOperator::LessThan => actual < *length,
                    ComparisonOperator::LessThanOrEqual => actual <= *length,
                    ComparisonOperator::Contains | ComparisonOperator::Matches => {
                        return Err(CheckError::new(
                            NAME,
                            format!("operator `{operator}` cannot compare lengths"),
                        ));
                    }
                };
                (!holds)
                    .then(|| format!("body length {actual} does not satisfy {operator} {length}"))
            }
        };

        Ok(failure.map(|message| Diagnostic::new(NAME, message)))
    }

    /// Looks up `path` in the JSON body and applies `check` to the value.
    fn json_path(
        response: &ResponseSpec,
        path: &str,
        check: impl FnOnce(&Value) -> Option<String>,
    ) -> Result<Option<String>, CheckError> {
        let Some(json) = response.body_as_json() else {
            return Ok(Some("body is not valid JSON".to_string()));
        };
        match json_path::query(&json, path) {
            Ok(Some(actual)) => Ok(check(&actual)),
            Ok(None) => Ok(Some("path not found".to_string())),
            Err(e) => Err(CheckError::new(NAME, e.to_string())),
        }
    }
}

#[async_trait]
impl Checker for AssertionChecker {
    fn name(&self) -> &str {
        NAME
    }

    async fn check(
        &self,
        test: &TestCase,
        response: &ResponseSpec,
    ) -> Result<Vec<Diagnostic>, CheckError> {
        let mut diagnostics = Vec::new();
        for assertion in &test.expect.assertions {
            if let Some(diagnostic) = Self::evaluate(assertion, response)? {
                diagnostics.push(diagnostic);
            }
        }
        Ok(diagnostics)
    }
}

fn compile(pattern: &str) -> Result<Regex, CheckError> {
    Regex::new(pattern).map_err(|e| CheckError::new(NAME, format!("invalid regex /{pattern}/: {e}")))
}

/// Shallow well-formedness check: starts and ends with a tag and has
/// balanced angle brackets.
fn looks_like_xml(body: &str) -> bool {
    let body = body.trim();
    body.starts_with('<')
        && body.ends_with('>')
        && body.matches('<').count() == body.matches('>').count()
}

fn compare_values(actual: &Value, operator: ComparisonOperator, expected: &Value) -> bool {
    match operator {
        ComparisonOperator::Equals => actual == expected,
        ComparisonOperator::NotEquals => actual != expected,
        ComparisonOperator::GreaterThan => compare_numeric(actual, expected, |a, b| a > b),
        ComparisonOperator::GreaterThanOrEqual => compare_numeric(actual, expected, |a, b| a >= b),
        ComparisonOperator::LessThan => compare_numeric(actual, expected, |a, b| a < b),
        ComparisonOperator::LessThanOrEqual => compare_numeric(actual, expected, |a, b| a <= b),
        ComparisonOperator::Contains => match (actual, expected) {
            (Value::String(s), Value::String(needle)) => s.contains(needle.as_str()),
            (Value::Array(items), _) => items.contains(expected),
            _ => false,
        },
        ComparisonOperator::Matches => match (actual, expected) {
            (Value::String(s), Value::String(pattern)) => {
                Regex::new(pattern).is_ok_and(|re| re.is_match(s))
            }
            _ => false,
        },
    }
}

fn compare_numeric(actual: &Value, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}
