//! Typed response assertions
//!
//! A test case may list any number of these under `expect.assertions`, next
//! to its expected body and headers. They are evaluated by the assertion
//! checker, in declaration order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One typed check against a response, tagged by `type` in definitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    /// The status code satisfies an expectation.
    StatusCode {
        /// Accepted status codes.
        expected: StatusExpectation,
    },
    /// The response arrived within a time budget.
    ResponseTime {
        /// Budget in milliseconds.
        max_ms: u64,
    },
    /// A header is present, with `value` if given.
    HeaderExists {
        /// Header name, matched case-insensitively.
        name: String,
        /// Exact value, if it matters.
        value: Option<String>,
    },
    /// A header value matches a regex.
    HeaderMatches {
        /// Header name.
        name: String,
        /// Regex the value must match.
        pattern: String,
    },
    /// The body contains a fragment.
    BodyContains {
        /// Fragment to look for.
        text: String,
        /// Compare case-insensitively.
        #[serde(default)]
        ignore_case: bool,
    },
    /// The body matches a regex.
    BodyMatches {
        /// Regex the body must match.
        pattern: String,
    },
    /// A JSON path resolves, to `expected` if given.
    JsonPath {
        /// Path such as `$.data.items[0].id`.
        path: String,
        /// Value the path must hold.
        expected: Option<serde_json::Value>,
    },
    /// The value at a JSON path compares to `value` with `operator`.
    JsonPathMatches {
        /// Path such as `$.total`.
        path: String,
        /// How to compare.
        operator: ComparisonOperator,
        /// Right-hand side of the comparison.
        value: serde_json::Value,
    },
    /// The body is exactly `expected`.
    BodyEquals {
        /// Full expected body.
        expected: String,
    },
    /// The body parses as JSON.
    IsJson,
    /// The body looks like an XML document.
    IsXml,
    /// The `Content-Type` header contains `expected`.
    ContentType {
        /// Fragment such as `application/json`.
        expected: String,
    },
    /// The body length in bytes compares to `length` with `operator`.
    BodyLength {
        /// How to compare.
        operator: ComparisonOperator,
        /// Right-hand side of the comparison.
        length: usize,
    },
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusCode { expected } => write!(f, "status {expected}"),
            Self::ResponseTime { max_ms } => write!(f, "response within {max_ms}ms"),
            Self::HeaderExists {
                name,
                value: Some(value),
            } => write!(f, "header `{name}` is `{value}`"),
            Self::HeaderExists { name, value: None } => write!(f, "header `{name}` is present"),
            Self::HeaderMatches { name, pattern } => write!(f, "header `{name}` ~ /{pattern}/"),
            Self::BodyContains { text, .. } => write!(f, "body contains `{text}`"),
            Self::BodyMatches { pattern } => write!(f, "body ~ /{pattern}/"),
            Self::JsonPath {
                path,
                expected: Some(value),
            } => write!(f, "{path} == {value}"),
            Self::JsonPath {
                path,
                expected: None,
            } => write!(f, "{path} is present"),
            Self::JsonPathMatches {
                path,
                operator,
                value,
            } => write!(f, "{path} {operator} {value}"),
            Self::BodyEquals { .. } => f.write_str("body equals expected"),
            Self::IsJson => f.write_str("body is JSON"),
            Self::IsXml => f.write_str("body is XML"),
            Self::ContentType { expected } => write!(f, "content type contains `{expected}`"),
            Self::BodyLength { operator, length } => write!(f, "body length {operator} {length}"),
        }
    }
}

/// Accepted status codes: a single code, an inclusive range or a set.
///
/// Written in definitions as `201`, `{min: 200, max: 299}` or `[200, 204]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StatusExpectation {
    /// Exactly this code.
    Exact(u16),
    /// Any code in `min..=max`.
    Range {
        /// Lowest accepted code.
        min: u16,
        /// Highest accepted code.
        max: u16,
    },
    /// Any of these codes.
    OneOf(Vec<u16>),
}

impl StatusExpectation {
    /// Returns true if `status` is accepted.
    #[must_use]
    pub fn matches(&self, status: u16) -> bool {
        match self {
            Self::Exact(code) => status == *code,
            Self::Range { min, max } => (*min..=*max).contains(&status),
            Self::OneOf(codes) => codes.contains(&status),
        }
    }
}

/// Any 2xx code.
impl Default for StatusExpectation {
    fn default() -> Self {
        Self::Range { min: 200, max: 299 }
    }
}

impl From<u16> for StatusExpectation {
    fn from(code: u16) -> Self {
        Self::Exact(code)
    }
}

impl fmt::Display for StatusExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(code) => write!(f, "= {code}"),
            Self::Range { min, max } => write!(f, "in {min}-{max}"),
            Self::OneOf(codes) => {
                let codes: Vec<String> = codes.iter().map(ToString::to_string).collect();
                write!(f, "in [{}]", codes.join(", "))
            }
        }
    }
}

/// Operators for [`Assertion::JsonPathMatches`] and [`Assertion::BodyLength`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// Substring or array membership.
    Contains,
    /// Regex match on the string form.
    Matches,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Contains => "contains",
            Self::Matches => "matches",
        })
    }
}
