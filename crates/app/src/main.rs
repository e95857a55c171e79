//! Gauntlet - Main Entry Point
//!
//! Parses the command line, initializes tracing and runs the harness. The
//! process exits with 0 when every test case passed or was skipped, 1 when
//! assertions failed and 2 when the run could not be assembled or a test
//! case could not be evaluated.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use gauntlet_application::RunError;
use gauntlet_infrastructure::{HarnessConfig, HarnessParams, JsonLinesSink, run_with_testing};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command, RunArgs};

const EXIT_ASSERTIONS_FAILED: u8 = 1;
const EXIT_BROKEN: u8 = 2;

fn init_tracing(debug: bool) {
    let default = if debug {
        "info,gauntlet=debug,gauntlet_application=debug,gauntlet_infrastructure=debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run(args: RunArgs) -> ExitCode {
    let config = match HarnessConfig::from_env() {
        Ok(config) => args.apply(config),
        Err(err) => {
            init_tracing(args.debug);
            error!(error = %err, "invalid configuration");
            return ExitCode::from(EXIT_BROKEN);
        }
    };
    init_tracing(config.debug);

    let mut params = HarnessParams::new(args.host.clone(), args.tests.clone());
    params.variables = args.variables();
    if let Some(path) = &args.jsonl {
        match JsonLinesSink::create(path) {
            Ok(sink) => params.outputs.push(Box::new(sink)),
            Err(err) => {
                error!(path = %path.display(), error = %err, "cannot open results file");
                return ExitCode::from(EXIT_BROKEN);
            }
        }
    }

    let outcome = match run_with_testing(params, config).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(error = %err, "failed to start run");
            return ExitCode::from(EXIT_BROKEN);
        }
    };

    match outcome.into_result() {
        Ok(summary) => {
            info!(%summary, "all tests passed");
            ExitCode::SUCCESS
        }
        Err(RunError::AssertionsFailed { first, summary }) => {
            error!(%first, %summary, "assertions failed");
            ExitCode::from(EXIT_ASSERTIONS_FAILED)
        }
        Err(err) => {
            error!(error = %err, "run aborted");
            ExitCode::from(EXIT_BROKEN)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
    }
}
