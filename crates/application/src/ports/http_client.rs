//! HTTP Client port

use async_trait::async_trait;
use gauntlet_domain::{HttpMethod, RequestSummary, ResponseSpec};
use thiserror::Error;
use url::Url;

/// Errors that can occur while sending a test request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpClientError {
    /// The resolved URL is invalid.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request body is invalid.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// The request timed out.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("DNS resolution failed for {host}: {message}")]
    DnsError {
        /// Host name.
        host: String,
        /// Resolver message.
        message: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Host name.
        host: String,
        /// Port.
        port: u16,
    },

    /// Any other connection-level failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The redirect limit was exceeded.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// Redirect limit.
        max: usize,
    },

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl HttpClientError {
    /// Returns true if the failure lies in the transport rather than in the
    /// request the test case described.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_) | Self::InvalidBody(_))
    }
}

/// A fully resolved request, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL including the query string.
    pub url: Url,
    /// Headers in send order.
    pub headers: Vec<(String, String)>,
    /// Body, if any.
    pub body: Option<String>,
}

impl PreparedRequest {
    /// Returns the method/URL pair recorded in test reports.
    #[must_use]
    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            method: self.method,
            url: self.url.to_string(),
        }
    }
}

/// Port for sending test requests to the system under test.
///
/// This trait abstracts the HTTP client implementation, allowing
/// the executor to be independent of specific HTTP libraries.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails due to network issues,
    /// timeout, or an invalid request.
    async fn send(&self, request: &PreparedRequest) -> Result<ResponseSpec, HttpClientError>;
}
