//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! Every request of a run goes through one shared client.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gauntlet_application::ports::{HttpClient, HttpClientError, PreparedRequest};
use gauntlet_domain::{HttpMethod, ResponseSpec};
use reqwest::{Client, Method, Proxy};
use url::Url;

/// Settings for [`ReqwestHttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Proxy every request is sent through. When unset, no proxy is used,
    /// regardless of the process environment.
    pub proxy: Option<Url>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum redirects followed.
    pub max_redirects: usize,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            user_agent: concat!("Gauntlet/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// HTTP client implementation using reqwest.
pub struct ReqwestHttpClient {
    client: Client,
    timeout: Duration,
    max_redirects: usize,
}

impl ReqwestHttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, HttpClientError> {
        Self::with_config(&HttpClientConfig::default())
    }

    /// Creates a new HTTP client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is rejected or the client cannot be
    /// created.
    pub fn with_config(config: &HttpClientConfig) -> Result<Self, HttpClientError> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(config.timeout);

        builder = match &config.proxy {
            Some(proxy) => builder.proxy(
                Proxy::all(proxy.as_str())
                    .map_err(|e| HttpClientError::InvalidUrl(format!("proxy {proxy}: {e}")))?,
            ),
            None => builder.no_proxy(),
        };

        let client = builder
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.timeout,
            max_redirects: config.max_redirects,
        })
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    /// Maps reqwest errors to `HttpClientError`.
    fn map_error(&self, error: &reqwest::Error) -> HttpClientError {
        let host = || {
            error
                .url()
                .and_then(|u| u.host_str())
                .unwrap_or("unknown")
                .to_string()
        };

        if error.is_timeout() {
            return HttpClientError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }

        if error.is_connect() {
            let message = error.to_string();
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") {
                return HttpClientError::DnsError {
                    host: host(),
                    message,
                };
            }
            if lower.contains("refused") {
                return HttpClientError::ConnectionRefused {
                    host: host(),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        if error.is_redirect() {
            return HttpClientError::TooManyRedirects {
                max: self.max_redirects,
            };
        }

        if error.is_builder() {
            return HttpClientError::InvalidUrl(error.to_string());
        }

        HttpClientError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: &PreparedRequest) -> Result<ResponseSpec, HttpClientError> {
        let start = Instant::now();

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| self.map_error(&e))?;
        let duration = start.elapsed();
        let status = response.status().as_u16();

        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let value = value.to_str().unwrap_or("<binary>");
            headers
                .entry(name.to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpClientError::Other(format!("failed to read body: {e}")))?;

        Ok(ResponseSpec::new(status, headers, &body, duration))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Get),
            Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Patch),
            Method::PATCH
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Options),
            Method::OPTIONS
        );
    }

    #[test]
    fn test_client_creation() {
        assert!(ReqwestHttpClient::new().is_ok());
    }

    #[test]
    fn test_client_with_proxy() {
        let config = HttpClientConfig {
            proxy: Some(Url::parse("http://proxy.local:3128").unwrap()),
            ..HttpClientConfig::default()
        };
        assert!(ReqwestHttpClient::with_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let client = ReqwestHttpClient::new().unwrap();
        // Port 9 (discard) is essentially never listening on loopback.
        let request = PreparedRequest {
            method: HttpMethod::Get,
            url: Url::parse("http://127.0.0.1:9/").unwrap(),
            headers: Vec::new(),
            body: None,
        };

        let err = client.send(&request).await.unwrap_err();
        assert!(err.is_transport(), "{err:?}");
    }
}
