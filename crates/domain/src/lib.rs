//! Gauntlet Domain - Core test harness types
//!
//! This crate defines the domain model for the Gauntlet HTTP API test harness:
//! test case definitions, request/response specifications, assertions and the
//! outcome model shared by every checker and output sink.
//! All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod id;
pub mod outcome;
pub mod request;
pub mod response;
pub mod test_case;
pub mod testing;

pub use error::{DomainError, DomainResult};
pub use id::generate_id;
pub use outcome::{Diagnostic, Outcome, OutcomeKind, RequestSummary, RunSummary, TestReport};
pub use request::{HttpMethod, RequestSpec};
pub use response::{ResponseSpec, StatusCode};
pub use test_case::{CompareOptions, DbCheck, Expectations, TestCase, TestStatus};
pub use testing::{Assertion, ComparisonOperator, StatusExpectation};
