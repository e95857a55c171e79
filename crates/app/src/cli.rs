//! Command line interface

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gauntlet_infrastructure::HarnessConfig;
use url::Url;

/// Declarative HTTP API test runner.
///
/// Loads YAML test cases, sends each request to the service under test and
/// checks the response against the declared expectations.
///
/// ENVIRONMENT VARIABLES:
///     `HTTP_PROXY`             Proxy URL for every request
///     `GAUNTLET_DEBUG`         Log full requests and responses
///     `GAUNTLET_FILE_FILTER`   Only load test files whose path contains this
///     `GAUNTLET_REPORT_DIR`    Write an Allure report into this directory
#[derive(Debug, Parser)]
#[command(name = "gauntlet")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every test case under a directory
    ///
    /// EXAMPLES:
    ///     gauntlet run --host http://localhost:8080 --tests tests/api
    ///     gauntlet run --host http://localhost:8080 --tests tests/api --var token=abc
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Base URL of the service under test
    #[arg(long, env = "GAUNTLET_HOST")]
    pub host: Url,
    /// YAML test file or directory
    #[arg(long, env = "GAUNTLET_TESTS")]
    pub tests: PathBuf,
    /// Write an Allure report into this directory
    #[arg(long)]
    pub report_dir: Option<PathBuf>,
    /// Only load test files whose path contains this string
    #[arg(long)]
    pub file_filter: Option<String>,
    /// Also write one JSON line per test case to this file
    #[arg(long)]
    pub jsonl: Option<PathBuf>,
    /// Log full requests and responses
    #[arg(long)]
    pub debug: bool,
    /// Run-level variable, repeatable
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
}

impl RunArgs {
    /// Applies the flags on top of the environment configuration.
    pub fn apply(&self, mut config: HarnessConfig) -> HarnessConfig {
        if self.report_dir.is_some() {
            config.report_dir.clone_from(&self.report_dir);
        }
        if self.file_filter.is_some() {
            config.file_filter.clone_from(&self.file_filter);
        }
        config.debug |= self.debug;
        config
    }

    pub fn variables(&self) -> BTreeMap<String, String> {
        self.vars.iter().cloned().collect()
    }
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run_args(args: &[&str]) -> RunArgs {
        let mut argv = vec!["gauntlet", "run", "--host", "http://localhost:8080", "--tests", "api"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Run(args) => args,
        }
    }

    #[test]
    fn test_vars_are_collected() {
        let args = run_args(&["--var", "token=abc", "--var", "query=a=b"]);
        let vars = args.variables();
        assert_eq!(vars["token"], "abc");
        assert_eq!(vars["query"], "a=b");
    }

    #[test]
    fn test_invalid_var_is_rejected() {
        let argv = ["gauntlet", "run", "--host", "http://h", "--tests", "t", "--var", "novalue"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_flags_override_environment() {
        let env = HarnessConfig {
            file_filter: Some("users".to_string()),
            report_dir: Some(PathBuf::from("env-reports")),
            ..HarnessConfig::default()
        };
        let config = run_args(&["--file-filter", "health", "--debug"]).apply(env);

        assert_eq!(config.file_filter.as_deref(), Some("health"));
        assert_eq!(config.report_dir, Some(PathBuf::from("env-reports")));
        assert!(config.debug);
    }
}
