//! Test case definitions
//!
//! A [`TestCase`] is produced by a loader, is immutable afterwards and is
//! read by the executor, every checker and every output sink.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::id::generate_id;
use crate::request::RequestSpec;
use crate::testing::{Assertion, StatusExpectation};

/// Declared execution status of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Run normally.
    #[default]
    None,
    /// Run this test; when any test is focused, unfocused tests are skipped.
    Focus,
    /// Never run this test.
    Skipped,
    /// The test is known to be broken; report it as broken without running it.
    Broken,
}

/// Options for structural comparison of expected and actual JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Compare only the shape and types, not leaf values.
    pub ignore_values: bool,
    /// Arrays match if they contain the same elements in any order.
    pub ignore_array_order: bool,
    /// Objects in the actual value may not carry fields the expectation omits.
    pub disallow_extra_fields: bool,
}

/// A database assertion: run `query`, expect exactly `rows`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbCheck {
    /// SQL query to execute after the request.
    pub query: String,
    /// Expected rows, each a JSON object keyed by column name.
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,
    /// Comparison options for the rows.
    #[serde(default)]
    pub compare: CompareOptions,
}

/// What the response must look like for the test case to pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Expectations {
    /// Expected status code, range or set.
    pub status: Option<StatusExpectation>,
    /// Headers that must be present with the given value.
    /// A value of the form `$matchRegexp(<re>)` is matched as a regex.
    pub headers: BTreeMap<String, String>,
    /// Expected body. JSON bodies are compared structurally, anything else as text.
    pub body: Option<String>,
    /// How the expected body is compared.
    pub compare: CompareOptions,
    /// Additional typed assertions.
    pub assertions: Vec<Assertion>,
}

/// A single declarative test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique identifier, assigned at load time.
    #[serde(default = "generate_id")]
    pub id: Uuid,
    /// Human-readable name, used for reporting and sub-run identity.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// File the test case was loaded from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Declared execution status.
    #[serde(default)]
    pub status: TestStatus,
    /// Request to send.
    pub request: RequestSpec,
    /// Expectations on the response.
    #[serde(default)]
    pub expect: Expectations,
    /// Fixture sets to load before the request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixtures: Vec<String>,
    /// Mock definitions keyed by mocked service name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mocks: BTreeMap<String, serde_json::Value>,
    /// Test-level variables; they shadow captured and run-level ones.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
    /// Variables to capture from the JSON response body, name to JSON path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub capture: BTreeMap<String, String>,
    /// Database assertions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub db_checks: Vec<DbCheck>,
}

impl TestCase {
    /// Creates a test case with the given name and request and no expectations.
    #[must_use]
    pub fn new(name: impl Into<String>, request: RequestSpec) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            description: None,
            file: None,
            status: TestStatus::None,
            request,
            expect: Expectations::default(),
            fixtures: Vec::new(),
            mocks: BTreeMap::new(),
            variables: BTreeMap::new(),
            capture: BTreeMap::new(),
            db_checks: Vec::new(),
        }
    }

    /// Sets the expectations (builder pattern).
    #[must_use]
    pub fn with_expect(mut self, expect: Expectations) -> Self {
        self.expect = expect;
        self
    }

    /// Sets the declared status (builder pattern).
    #[must_use]
    pub const fn with_status(mut self, status: TestStatus) -> Self {
        self.status = status;
        self
    }

    /// Checks the invariants every loaded test case must satisfy.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or a capture path is not a JSON path.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::EmptyTestName);
        }
        if let Some((var, path)) = self
            .capture
            .iter()
            .find(|(_, path)| !path.trim_start().starts_with('$'))
        {
            return Err(DomainError::InvalidTestCase {
                name: self.name.clone(),
                reason: format!("capture `{var}` uses `{path}`, expected a path starting with '$'"),
            });
        }
        Ok(())
    }

    /// Returns true if the test is declared as focused.
    #[must_use]
    pub const fn is_focused(&self) -> bool {
        matches!(self.status, TestStatus::Focus)
    }
}
