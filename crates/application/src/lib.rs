//! Gauntlet Application - Ports, executor and run orchestration
//!
//! This crate defines the application layer with:
//! - Port traits for every collaborator (loader, HTTP client, fixtures,
//!   mocks, database, checkers, output sinks, host bridge)
//! - The per-test executor and its outcome classification
//! - The run orchestrator that fans outcomes out to output sinks

pub mod error;
pub mod execution;
pub mod executor;
pub mod json_path;
pub mod ports;
pub mod registry;
pub mod runner;
pub mod variable_resolver;

pub use error::{ExecutionError, RunError, RunResult, TestCaseError};
pub use execution::{Execution, ExecutionResult};
pub use executor::TestExecutor;
pub use registry::{CheckerRegistry, OutputRegistry};
pub use runner::{Runner, RunnerConfig};
