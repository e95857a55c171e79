//! Response specification type
//!
//! The actual response a test case received, as seen by checkers and
//! output sinks.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP status code with semantic helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// Creates a new `StatusCode`.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric status code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true if this is a 2xx success status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns the canonical reason phrase for common status codes.
    #[must_use]
    pub const fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// HTTP response received by a test case.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseSpec {
    /// HTTP status code.
    pub status: u16,
    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,
    /// Response headers. Repeated headers are joined with `", "`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body as (lossy) UTF-8 text.
    pub body: String,
    /// Round-trip time.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl ResponseSpec {
    /// Creates a new `ResponseSpec` from raw response data.
    #[must_use]
    pub fn new(
        status: impl Into<StatusCode>,
        headers: BTreeMap<String, String>,
        body: &[u8],
        duration: Duration,
    ) -> Self {
        let status = status.into();
        Self {
            status: status.as_u16(),
            status_text: status.reason_phrase().to_string(),
            headers,
            body: String::from_utf8_lossy(body).into_owned(),
            duration,
        }
    }

    /// Returns the status as a `StatusCode` struct.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::new(self.status)
    }

    /// Gets a header value by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Returns the `Content-Type` header, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&String> {
        self.get_header("content-type")
    }

    /// Attempts to parse the body as JSON.
    #[must_use]
    pub fn body_as_json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Returns at most `max` bytes of the body for display, cut on a char boundary.
    #[must_use]
    pub fn body_preview(&self, max: usize) -> String {
        if self.body.len() <= max {
            return self.body.clone();
        }
        let mut end = max;
        while !self.body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &self.body[..end])
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response(body: &str) -> ResponseSpec {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        ResponseSpec::new(201u16, headers, body.as_bytes(), Duration::from_millis(12))
    }

    #[test]
    fn test_new_sets_status_text() {
        let resp = response("{}");
        assert_eq!(resp.status, 201);
        assert_eq!(resp.status_text, "Created");
        assert!(resp.status_code().is_success());
        assert_eq!(resp.status_code().to_string(), "201 Created");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let resp = response("{}");
        assert_eq!(
            resp.get_header("content-type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(resp.content_type(), resp.get_header("CONTENT-TYPE"));
        assert!(resp.get_header("x-missing").is_none());
    }

    #[test]
    fn test_body_as_json() {
        assert_eq!(
            response(r#"{"id": 1}"#).body_as_json(),
            Some(serde_json::json!({"id": 1}))
        );
        assert_eq!(response("not json").body_as_json(), None);
    }

    #[test]
    fn test_body_preview_respects_char_boundaries() {
        let resp = response("héllo");
        assert_eq!(resp.body_preview(2), "h...");
        assert_eq!(resp.body_preview(10), "héllo");
    }

    #[test]
    fn test_duration_serializes_as_millis() {
        let json = serde_json::to_value(response("")).unwrap_or_default();
        assert_eq!(json["duration"], serde_json::json!(12));
    }
}
