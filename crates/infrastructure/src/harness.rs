//! Harness entry point
//!
//! [`run_with_testing`] assembles a full run from explicit parameters and an
//! environment-sourced [`HarnessConfig`], then drives it through the built-in
//! [`TestingHandler`] host bridge.

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use gauntlet_application::ports::{
    Checker, Database, FixtureLoader, HttpClientError, MockServer, OutputSink, SinkError,
};
use gauntlet_application::{RunError, Runner, RunnerConfig};
use gauntlet_domain::RunSummary;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::adapters::{HttpClientConfig, ReqwestHttpClient};
use crate::checkers::{AssertionChecker, BodyChecker, DbChecker, HeaderChecker};
use crate::host::{SubRun, TestingHandler};
use crate::loader::YamlFileLoader;
use crate::output::{AllureSink, ConsoleSink};

/// Environment variable holding the proxy URL.
pub const ENV_HTTP_PROXY: &str = "HTTP_PROXY";
/// Environment variable enabling request/response dumps.
pub const ENV_DEBUG: &str = "GAUNTLET_DEBUG";
/// Environment variable restricting which test files are loaded.
pub const ENV_FILE_FILTER: &str = "GAUNTLET_FILE_FILTER";
/// Environment variable enabling the Allure report directory.
pub const ENV_REPORT_DIR: &str = "GAUNTLET_REPORT_DIR";

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The proxy URL could not be parsed.
    #[error("invalid proxy URL `{value}`: {source}")]
    InvalidProxyUrl {
        /// Raw value.
        value: String,
        /// Parser error.
        source: url::ParseError,
    },
}

/// Errors that abort a run before any test case executes.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] HttpClientError),

    /// The Allure report directory could not be prepared.
    #[error("failed to prepare report directory {}: {source}", .dir.display())]
    ReportDir {
        /// Requested directory.
        dir: PathBuf,
        /// Underlying error.
        source: SinkError,
    },
}

/// Run settings sourced from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Proxy for every request.
    pub proxy_url: Option<Url>,
    /// Log full requests and responses.
    pub debug: bool,
    /// Only load test files whose path contains this string.
    pub file_filter: Option<String>,
    /// Write an Allure report into this directory.
    pub report_dir: Option<PathBuf>,
}

impl HarnessConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `HTTP_PROXY` is set but is not a valid URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy value is not a valid URL.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let proxy_url = get(ENV_HTTP_PROXY)
            .map(|value| {
                Url::parse(&value).map_err(|source| ConfigError::InvalidProxyUrl { value, source })
            })
            .transpose()?;

        Ok(Self {
            proxy_url,
            debug: get(ENV_DEBUG).is_some(),
            file_filter: get(ENV_FILE_FILTER),
            report_dir: get(ENV_REPORT_DIR).map(PathBuf::from),
        })
    }
}

/// Everything a run needs besides its environment configuration.
pub struct HarnessParams {
    /// Base URL of the service under test.
    pub host: Url,
    /// File or directory holding the YAML test definitions.
    pub tests: PathBuf,
    /// Output sinks. A console sink is used when empty.
    pub outputs: Vec<Box<dyn OutputSink>>,
    /// Checkers run after the built-in ones.
    pub checkers: Vec<Box<dyn Checker>>,
    /// Fixture loader, if any.
    pub fixtures: Option<Arc<dyn FixtureLoader>>,
    /// Mock server, if any.
    pub mocks: Option<Arc<dyn MockServer>>,
    /// Database for `db_checks`, if any.
    pub database: Option<Arc<dyn Database>>,
    /// Run-level variables.
    pub variables: BTreeMap<String, String>,
}

impl HarnessParams {
    /// Creates parameters with no optional collaborators.
    #[must_use]
    pub fn new(host: Url, tests: impl Into<PathBuf>) -> Self {
        Self {
            host,
            tests: tests.into(),
            outputs: Vec::new(),
            checkers: Vec::new(),
            fixtures: None,
            mocks: None,
            database: None,
            variables: BTreeMap::new(),
        }
    }
}

/// Result of a harness run together with the host ledger.
#[derive(Debug)]
pub struct HarnessOutcome {
    /// Orchestrator result.
    pub run: Result<RunSummary, RunError>,
    /// Sub-runs recorded by the host bridge.
    pub sub_runs: Vec<SubRun>,
}

impl HarnessOutcome {
    /// Drops the ledger and returns the run result.
    ///
    /// # Errors
    ///
    /// Returns the run error, if any.
    pub fn into_result(self) -> Result<RunSummary, RunError> {
        self.run
    }
}

/// Builds and runs the harness.
///
/// # Errors
///
/// Returns an error only if the run could not be assembled. Failures during
/// the run are carried by [`HarnessOutcome::run`].
pub async fn run_with_testing(
    params: HarnessParams,
    config: HarnessConfig,
) -> Result<HarnessOutcome, HarnessError> {
    let HarnessParams {
        host,
        tests,
        outputs,
        checkers,
        fixtures,
        mocks,
        database,
        variables,
    } = params;

    let client = ReqwestHttpClient::with_config(&HttpClientConfig {
        proxy: config.proxy_url.clone(),
        ..HttpClientConfig::default()
    })?;

    let allure = config
        .report_dir
        .as_ref()
        .map(|dir| {
            AllureSink::new(dir.clone(), "gauntlet").map_err(|source| HarnessError::ReportDir {
                dir: dir.clone(),
                source,
            })
        })
        .transpose()?;

    let mut loader = YamlFileLoader::new(tests);
    loader.set_file_filter(config.file_filter.clone());

    let mut runner_config = RunnerConfig::new(host, Arc::new(client))
        .with_variables(variables)
        .with_debug(config.debug);
    if let Some(fixtures) = fixtures {
        runner_config = runner_config.with_fixtures(fixtures);
    }
    if let Some(mocks) = mocks {
        runner_config = runner_config.with_mocks(mocks);
    }

    let handler = Arc::new(TestingHandler::new());
    let mut runner = Runner::new(runner_config, Box::new(loader), handler.clone());

    runner.add_checker(Box::new(BodyChecker));
    runner.add_checker(Box::new(HeaderChecker));
    runner.add_checker(Box::new(AssertionChecker));
    if let Some(database) = database {
        runner.add_checker(Box::new(DbChecker::new(database)));
    }
    runner.add_checkers(checkers);

    if outputs.is_empty() {
        runner.add_output(Box::new(ConsoleSink::new()));
    }
    for sink in outputs {
        runner.add_output(sink);
    }
    if let Some(allure) = allure {
        info!(dir = %allure.dir().display(), "writing allure report");
        runner.add_output(Box::new(allure));
    }
    debug!(
        checkers = runner.checker_count(),
        outputs = runner.output_count(),
        "harness assembled"
    );

    let run = runner.run().await;
    Ok(HarnessOutcome {
        run,
        sub_runs: handler.sub_runs(),
    })
}
