//! Per-test executor
//!
//! Drives one test case through its pipeline: declared status gate, fixture
//! loading, mock preparation, variable substitution, the HTTP exchange, the
//! checkers, mock verification and variable capture.

use std::collections::BTreeMap;

use async_trait::async_trait;
use gauntlet_domain::{Diagnostic, ResponseSpec, TestCase, TestStatus};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ExecutionError;
use crate::execution::{Execution, ExecutionResult};
use crate::json_path;
use crate::ports::{ExecuteTest, PreparedRequest};
use crate::registry::CheckerRegistry;
use crate::runner::RunnerConfig;
use crate::variable_resolver::VariableResolver;

/// Largest body fragment written to the debug log.
const DEBUG_BODY_PREVIEW: usize = 4096;

/// Executes test cases against the configured host.
///
/// Values captured from one test case's response are visible to every later
/// test case executed by the same executor.
pub struct TestExecutor {
    config: RunnerConfig,
    checkers: CheckerRegistry,
    focus_mode: bool,
    captured: Mutex<BTreeMap<String, String>>,
}

impl TestExecutor {
    /// Creates an executor with the given configuration and checkers.
    #[must_use]
    pub fn new(config: RunnerConfig, checkers: CheckerRegistry) -> Self {
        Self {
            config,
            checkers,
            focus_mode: false,
            captured: Mutex::new(BTreeMap::new()),
        }
    }

    /// When enabled, test cases that are not declared `focus` are skipped.
    #[must_use]
    pub const fn with_focus_mode(mut self, focus_mode: bool) -> Self {
        self.focus_mode = focus_mode;
        self
    }

    /// Returns a snapshot of the variables captured so far.
    #[must_use]
    pub fn captured(&self) -> BTreeMap<String, String> {
        self.captured.lock().clone()
    }

    /// Declared status gate. Returns the execution to report instead of
    /// running the test, if any.
    fn gate(&self, test: &TestCase) -> Option<Execution> {
        match test.status {
            TestStatus::Skipped => Some(Execution::skipped("test is marked as skipped")),
            TestStatus::Broken => Some(Execution::Broken {
                cause: ExecutionError::MarkedBroken,
            }),
            TestStatus::None if self.focus_mode => Some(Execution::skipped("not focused")),
            TestStatus::None | TestStatus::Focus => None,
        }
    }

    async fn load_fixtures(&self, test: &TestCase) -> Result<(), ExecutionError> {
        if test.fixtures.is_empty() {
            return Ok(());
        }
        let Some(loader) = &self.config.fixtures else {
            return Err(ExecutionError::NoFixtureLoader(test.fixtures.clone()));
        };
        debug!(test = %test.name, fixtures = ?test.fixtures, "loading fixtures");
        loader.load(&test.fixtures).await?;
        Ok(())
    }

    async fn prepare_mocks(&self, test: &TestCase) -> Result<(), ExecutionError> {
        if test.mocks.is_empty() {
            return Ok(());
        }
        let Some(mocks) = &self.config.mocks else {
            return Err(ExecutionError::NoMockServer);
        };
        mocks.prepare(&test.mocks).await?;
        Ok(())
    }

    /// Substitutes variables into a copy of the test case.
    fn resolve(&self, test: &TestCase) -> TestCase {
        let captured = self.captured();
        let mut resolver = VariableResolver::new(&test.variables, &captured, &self.config.variables);
        let (resolved, unresolved) = resolver.resolve_test_case(test);
        if !unresolved.is_empty() {
            warn!(test = %test.name, ?unresolved, "unresolved variables were left as-is");
        }
        resolved
    }

    /// Builds the wire request from a resolved test case.
    fn prepare_request(&self, test: &TestCase) -> Result<PreparedRequest, ExecutionError> {
        let spec = &test.request;
        let mut url = build_url(&self.config.host, &spec.path)?;
        if !spec.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&spec.query);
        }

        let mut headers: Vec<(String, String)> = spec
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(body) = &spec.body
            && !spec.has_content_type()
            && serde_json::from_str::<serde_json::Value>(body).is_ok()
        {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        Ok(PreparedRequest {
            method: spec.method,
            url,
            headers,
            body: spec.body.clone(),
        })
    }

    /// Reads the test's capture paths from the response body.
    ///
    /// Successfully captured values are stored even when another path is
    /// missing; each missing path yields one diagnostic.
    fn capture(&self, test: &TestCase, response: &ResponseSpec) -> Vec<Diagnostic> {
        if test.capture.is_empty() {
            return Vec::new();
        }
        let Some(json) = response.body_as_json() else {
            return test
                .capture
                .keys()
                .map(|var| {
                    Diagnostic::new(
                        "capture",
                        format!("cannot capture `{var}`: response body is not JSON"),
                    )
                })
                .collect();
        };

        let mut diagnostics = Vec::new();
        let mut captured = self.captured.lock();
        for (var, path) in &test.capture {
            match json_path::query(&json, path) {
                Ok(Some(value)) => {
                    let value = json_path::to_plain_string(&value);
                    debug!(test = %test.name, variable = %var, %value, "captured variable");
                    captured.insert(var.clone(), value);
                }
                Ok(None) => diagnostics.push(Diagnostic::at(
                    "capture",
                    path.clone(),
                    format!("path not found, cannot capture `{var}`"),
                )),
                Err(err) => {
                    diagnostics.push(Diagnostic::at("capture", path.clone(), err.to_string()));
                }
            }
        }
        diagnostics
    }

    async fn run_pipeline(&self, test: &TestCase) -> Execution {
        if let Some(execution) = self.gate(test) {
            return execution;
        }
        if let Err(cause) = self.load_fixtures(test).await {
            return Execution::Broken { cause };
        }

        let resolved = self.resolve(test);
        if let Err(cause) = self.prepare_mocks(&resolved).await {
            return Execution::Broken { cause };
        }
        let request = match self.prepare_request(&resolved) {
            Ok(request) => request,
            Err(error) => return Execution::Fatal { error },
        };

        if self.config.debug {
            info!(
                test = %test.name,
                method = %request.method,
                url = %request.url,
                headers = ?request.headers,
                body = request.body.as_deref().unwrap_or(""),
                "sending request"
            );
        }

        let response = match self.config.http_client.send(&request).await {
            Ok(response) => response,
            Err(err) if err.is_transport() => {
                return Execution::Broken { cause: err.into() };
            }
            Err(err) => return Execution::Fatal { error: err.into() },
        };

        if self.config.debug {
            info!(
                test = %test.name,
                status = response.status,
                duration_ms = u64::try_from(response.duration.as_millis()).unwrap_or(u64::MAX),
                headers = ?response.headers,
                body = %response.body_preview(DEBUG_BODY_PREVIEW),
                "received response"
            );
        }

        let mut diagnostics = match self.checkers.check_all(&resolved, &response).await {
            Ok(diagnostics) => diagnostics,
            Err(err) => return Execution::Fatal { error: err.into() },
        };
        if !test.mocks.is_empty()
            && let Some(mocks) = &self.config.mocks
        {
            diagnostics.extend(mocks.verify().await);
        }
        if diagnostics.is_empty() {
            diagnostics = self.capture(&resolved, &response);
        }

        Execution::completed(ExecutionResult {
            request: request.summary(),
            response,
            diagnostics,
        })
    }
}

#[async_trait]
impl ExecuteTest for TestExecutor {
    async fn execute(&self, test: &TestCase) -> Execution {
        self.run_pipeline(test).await
    }
}

/// Joins the request path onto the host. Absolute URLs are used as-is.
fn build_url(host: &Url, path: &str) -> Result<Url, ExecutionError> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Url::parse(path)
            .map_err(|e| ExecutionError::InvalidRequest(format!("invalid URL `{path}`: {e}")));
    }
    let base = host.as_str().trim_end_matches('/');
    let joined = if path.is_empty() || path.starts_with('/') || path.starts_with('?') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    };
    Url::parse(&joined)
        .map_err(|e| ExecutionError::InvalidRequest(format!("invalid URL `{joined}`: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use gauntlet_domain::{Expectations, HttpMethod, OutcomeKind, RequestSpec};
    use pretty_assertions::assert_eq;

    use crate::ports::{
        CheckError, Checker, FixtureError, FixtureLoader, HttpClient, HttpClientError,
        MockError, MockServer,
    };

    /// Replies with canned responses and remembers every request.
    #[derive(Default)]
    struct MockHttpClient {
        responses: Mutex<Vec<Result<ResponseSpec, HttpClientError>>>,
        requests: Mutex<Vec<PreparedRequest>>,
    }

    impl MockHttpClient {
        fn replying(responses: Vec<Result<ResponseSpec, HttpClientError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                requests: Mutex::default(),
            })
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn send(&self, request: &PreparedRequest) -> Result<ResponseSpec, HttpClientError> {
            self.requests.lock().push(request.clone());
            self.responses
                .lock()
                .pop()
                .unwrap_or_else(|| Err(HttpClientError::Other("no canned response".to_string())))
        }
    }

    struct StatusChecker;

    #[async_trait]
    impl Checker for StatusChecker {
        fn name(&self) -> &str {
            "status"
        }

        async fn check(
            &self,
            test: &TestCase,
            response: &ResponseSpec,
        ) -> Result<Vec<Diagnostic>, CheckError> {
            let Some(expected) = &test.expect.status else {
                return Ok(Vec::new());
            };
            if expected.matches(response.status) {
                Ok(Vec::new())
            } else {
                Ok(vec![Diagnostic::new(
                    "status",
                    format!("status {expected} expected, got {}", response.status),
                )])
            }
        }
    }

    struct ErroringChecker;

    #[async_trait]
    impl Checker for ErroringChecker {
        fn name(&self) -> &str {
            "erroring"
        }

        async fn check(
            &self,
            _test: &TestCase,
            _response: &ResponseSpec,
        ) -> Result<Vec<Diagnostic>, CheckError> {
            Err(CheckError::new("erroring", "cannot evaluate"))
        }
    }

    struct FailingFixtures;

    #[async_trait]
    impl FixtureLoader for FailingFixtures {
        async fn load(&self, fixtures: &[String]) -> Result<(), FixtureError> {
            Err(FixtureError::NotFound(fixtures[0].clone()))
        }
    }

    struct UnmetMocks;

    #[async_trait]
    impl MockServer for UnmetMocks {
        async fn prepare(
            &self,
            _definitions: &BTreeMap<String, serde_json::Value>,
        ) -> Result<(), MockError> {
            Ok(())
        }

        async fn verify(&self) -> Vec<Diagnostic> {
            vec![Diagnostic::new("mocks", "payments: expected 1 call, got 0")]
        }
    }

    /// Remembers the definitions it was asked to prepare.
    #[derive(Default)]
    struct RecordingMocks {
        prepared: Mutex<Vec<BTreeMap<String, serde_json::Value>>>,
    }

    #[async_trait]
    impl MockServer for RecordingMocks {
        async fn prepare(
            &self,
            definitions: &BTreeMap<String, serde_json::Value>,
        ) -> Result<(), MockError> {
            self.prepared.lock().push(definitions.clone());
            Ok(())
        }

        async fn verify(&self) -> Vec<Diagnostic> {
            Vec::new()
        }
    }

    fn json_response(status: u16, body: &str) -> ResponseSpec {
        ResponseSpec::new(
            status,
            BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())]),
            body.as_bytes(),
            Duration::from_millis(5),
        )
    }

    fn config(client: Arc<MockHttpClient>) -> RunnerConfig {
        RunnerConfig::new(Url::parse("http://api.local/v1/").unwrap(), client)
    }

    fn executor(client: Arc<MockHttpClient>) -> TestExecutor {
        let mut checkers = CheckerRegistry::new();
        checkers.add(Box::new(StatusChecker));
        TestExecutor::new(config(client), checkers)
    }

    fn expect_status(code: u16) -> Expectations {
        Expectations {
            status: Some(gauntlet_domain::StatusExpectation::Exact(code)),
            ..Expectations::default()
        }
    }

    #[tokio::test]
    async fn test_passing_test_case() {
        let client = MockHttpClient::replying(vec![Ok(json_response(200, "{}"))]);
        let executor = executor(client.clone());
        let test = TestCase::new("ok", RequestSpec::get("/users").with_query("page", "2"))
            .with_expect(expect_status(200));

        let execution = executor.execute(&test).await;
        let Execution::Passed(result) = execution else {
            panic!("expected pass, got {execution:?}");
        };
        assert_eq!(result.request.url, "http://api.local/v1/users?page=2");
        assert_eq!(result.response.status, 200);
    }

    #[tokio::test]
    async fn test_failing_status_is_failed_not_broken() {
        let client = MockHttpClient::replying(vec![Ok(json_response(500, "{}"))]);
        let executor = executor(client);
        let test =
            TestCase::new("boom", RequestSpec::get("/users")).with_expect(expect_status(200));

        let execution = executor.execute(&test).await;
        assert_eq!(execution.outcome().kind(), OutcomeKind::Failed);
        assert_eq!(
            execution.result().unwrap().diagnostics,
            vec![Diagnostic::new("status", "status = 200 expected, got 500")]
        );
    }

    #[tokio::test]
    async fn test_declared_status_gate() {
        let client = MockHttpClient::replying(vec![]);
        let executor = executor(client.clone());

        let skipped = TestCase::new("s", RequestSpec::get("/")).with_status(TestStatus::Skipped);
        assert!(matches!(
            executor.execute(&skipped).await,
            Execution::Skipped { reason } if reason == "test is marked as skipped"
        ));

        let broken = TestCase::new("b", RequestSpec::get("/")).with_status(TestStatus::Broken);
        assert!(matches!(
            executor.execute(&broken).await,
            Execution::Broken {
                cause: ExecutionError::MarkedBroken
            }
        ));
        assert!(client.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_focus_mode_skips_unfocused() {
        let client = MockHttpClient::replying(vec![Ok(json_response(200, "{}"))]);
        let executor = executor(client).with_focus_mode(true);

        let plain = TestCase::new("plain", RequestSpec::get("/"));
        assert!(matches!(
            executor.execute(&plain).await,
            Execution::Skipped { reason } if reason == "not focused"
        ));

        let focused = TestCase::new("focused", RequestSpec::get("/")).with_status(TestStatus::Focus);
        assert!(matches!(executor.execute(&focused).await, Execution::Passed(_)));
    }

    #[tokio::test]
    async fn test_fixtures_without_loader_is_broken() {
        let executor = executor(MockHttpClient::replying(vec![]));
        let mut test = TestCase::new("needs_fixtures", RequestSpec::get("/"));
        test.fixtures = vec!["users".to_string()];

        let execution = executor.execute(&test).await;
        assert!(matches!(
            execution,
            Execution::Broken {
                cause: ExecutionError::NoFixtureLoader(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_fixture_failure_is_broken() {
        let client = MockHttpClient::replying(vec![]);
        let config = config(client).with_fixtures(Arc::new(FailingFixtures));
        let executor = TestExecutor::new(config, CheckerRegistry::new());
        let mut test = TestCase::new("broken_fixture_test", RequestSpec::get("/"));
        test.fixtures = vec!["users".to_string()];

        let execution = executor.execute(&test).await;
        assert_eq!(
            execution.outcome(),
            gauntlet_domain::Outcome::Broken {
                cause: "fixture `users` not found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_broken_and_bad_url_is_fatal() {
        let client = MockHttpClient::replying(vec![Err(HttpClientError::ConnectionRefused {
            host: "api.local".to_string(),
            port: 80,
        })]);
        let executor = executor(client);

        let test = TestCase::new("down", RequestSpec::get("/"));
        assert!(matches!(
            executor.execute(&test).await,
            Execution::Broken {
                cause: ExecutionError::Http(_)
            }
        ));

        let bad = TestCase::new("bad", RequestSpec::get("http://[::1"));
        assert!(matches!(
            executor.execute(&bad).await,
            Execution::Fatal {
                error: ExecutionError::InvalidRequest(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_check_error_is_fatal() {
        let client = MockHttpClient::replying(vec![Ok(json_response(200, "{}"))]);
        let mut checkers = CheckerRegistry::new();
        checkers.add(Box::new(ErroringChecker));
        let executor = TestExecutor::new(config(client), checkers);

        let execution = executor
            .execute(&TestCase::new("t", RequestSpec::get("/")))
            .await;
        assert!(matches!(
            execution,
            Execution::Fatal {
                error: ExecutionError::Check(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_mock_verification_appends_diagnostics() {
        let client = MockHttpClient::replying(vec![Ok(json_response(200, "{}"))]);
        let config = config(client).with_mocks(Arc::new(UnmetMocks));
        let mut checkers = CheckerRegistry::new();
        checkers.add(Box::new(StatusChecker));
        let executor = TestExecutor::new(config, checkers);

        let mut test = TestCase::new("pay", RequestSpec::new(HttpMethod::Post, "/pay"))
            .with_expect(expect_status(201));
        test.mocks
            .insert("payments".to_string(), serde_json::json!({"strategy": "constant"}));

        let execution = executor.execute(&test).await;
        let rendered: Vec<_> = execution
            .result()
            .unwrap()
            .diagnostics
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            rendered,
            vec![
                "[status] status = 201 expected, got 200",
                "[mocks] payments: expected 1 call, got 0"
            ]
        );
    }

    #[tokio::test]
    async fn test_mock_definitions_are_resolved() {
        let client = MockHttpClient::replying(vec![Ok(json_response(200, "{}"))]);
        let mocks = Arc::new(RecordingMocks::default());
        let config = config(client)
            .with_mocks(mocks.clone())
            .with_variables(BTreeMap::from([("order".to_string(), "A-17".to_string())]));
        let executor = TestExecutor::new(config, CheckerRegistry::new());

        let mut test = TestCase::new("pay", RequestSpec::new(HttpMethod::Post, "/pay"));
        test.mocks.insert(
            "payments".to_string(),
            serde_json::json!({"request": {"path": "/orders/{{order}}"}}),
        );

        assert!(matches!(executor.execute(&test).await, Execution::Passed(_)));
        assert_eq!(
            mocks.prepared.lock()[0]["payments"],
            serde_json::json!({"request": {"path": "/orders/A-17"}})
        );
    }

    #[tokio::test]
    async fn test_capture_feeds_later_tests() {
        let client = MockHttpClient::replying(vec![
            Ok(json_response(201, r#"{"user": {"id": 42}}"#)),
            Ok(json_response(200, "{}")),
        ]);
        let executor = executor(client.clone());

        let mut create = TestCase::new(
            "create_user",
            RequestSpec::new(HttpMethod::Post, "/users").with_body(r#"{"name": "ada"}"#),
        );
        create
            .capture
            .insert("user_id".to_string(), "$.user.id".to_string());
        let get = TestCase::new("get_user", RequestSpec::get("/users/{{user_id}}"));

        assert!(matches!(executor.execute(&create).await, Execution::Passed(_)));
        assert!(matches!(executor.execute(&get).await, Execution::Passed(_)));

        let requests = client.requests.lock();
        assert!(
            requests[0]
                .headers
                .contains(&("Content-Type".to_string(), "application/json".to_string()))
        );
        assert_eq!(requests[1].url.as_str(), "http://api.local/v1/users/42");
        assert_eq!(executor.captured()["user_id"], "42");
    }

    #[tokio::test]
    async fn test_missing_capture_path_fails() {
        let client = MockHttpClient::replying(vec![Ok(json_response(200, r#"{"a": 1}"#))]);
        let executor = executor(client);
        let mut test = TestCase::new("capture", RequestSpec::get("/"));
        test.capture.insert("token".to_string(), "$.token".to_string());

        let execution = executor.execute(&test).await;
        assert_eq!(
            execution.result().unwrap().diagnostics,
            vec![Diagnostic::at(
                "capture",
                "$.token",
                "path not found, cannot capture `token`"
            )]
        );
    }

    #[test]
    fn test_build_url_joins_paths() {
        let host = Url::parse("http://api.local/v1").unwrap();
        assert_eq!(
            build_url(&host, "/users").unwrap().as_str(),
            "http://api.local/v1/users"
        );
        assert_eq!(
            build_url(&host, "users").unwrap().as_str(),
            "http://api.local/v1/users"
        );
        assert_eq!(
            build_url(&host, "https://other.local/x").unwrap().as_str(),
            "https://other.local/x"
        );
    }
}
