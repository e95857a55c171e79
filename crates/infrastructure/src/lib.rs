//! Gauntlet Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports defined in the
//! application layer: the reqwest HTTP client, the YAML test loader, the
//! built-in checkers, output sinks and the in-memory host bridge, plus the
//! [`run_with_testing`] entry point that wires them together.

pub mod adapters;
pub mod checkers;
pub mod harness;
pub mod host;
pub mod loader;
pub mod output;

pub use adapters::{HttpClientConfig, ReqwestHttpClient};
pub use checkers::{AssertionChecker, BodyChecker, DbChecker, HeaderChecker};
pub use harness::{
    ConfigError, HarnessConfig, HarnessError, HarnessOutcome, HarnessParams, run_with_testing,
};
pub use host::{SubRun, SubRunStatus, TestingHandler};
pub use loader::YamlFileLoader;
pub use output::{AllureSink, ConsoleSink, JsonLinesSink};
