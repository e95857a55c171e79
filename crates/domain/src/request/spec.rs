//! Request specification type

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::HttpMethod;

/// The HTTP request a test case sends to the system under test.
///
/// `path` is relative to the run's target host. Every string field may
/// contain `{{variable}}` placeholders that are resolved right before
/// the request is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// HTTP method
    #[serde(default)]
    pub method: HttpMethod,
    /// Path relative to the target host (e.g. `/users/{{user_id}}`)
    pub path: String,
    /// Query parameters, sent in key order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
    /// Request headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Raw request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl RequestSpec {
    /// Creates a request with the given method and path.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Self::default()
        }
    }

    /// Creates a GET request for the given path.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Adds a header (builder pattern).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a query parameter (builder pattern).
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Sets the body (builder pattern).
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns true if a `Content-Type` header is set explicitly.
    #[must_use]
    pub fn has_content_type(&self) -> bool {
        self.headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("content-type"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder() {
        let req = RequestSpec::new(HttpMethod::Post, "/users")
            .with_header("Content-Type", "application/json")
            .with_query("dry_run", "true")
            .with_body("{}");

        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "/users");
        assert_eq!(req.query.get("dry_run").map(String::as_str), Some("true"));
        assert_eq!(req.body.as_deref(), Some("{}"));
        assert!(req.has_content_type());
    }

    #[test]
    fn test_defaults_to_get() {
        let req: RequestSpec = serde_json::from_str(r#"{"path": "/health"}"#).unwrap_or_default();
        assert_eq!(req, RequestSpec::get("/health"));
        assert!(!req.has_content_type());
    }
}
