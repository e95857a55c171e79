//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the run orchestrator and the
//! collaborators it drives. Each port is a trait implemented by adapters in
//! the infrastructure layer (or by test doubles).

mod checker;
mod database;
mod fixtures;
mod http_client;
mod mocks;
mod output;
mod test_handler;
mod test_loader;

pub use checker::{CheckError, Checker};
pub use database::{Database, DatabaseError};
pub use fixtures::{FixtureError, FixtureLoader};
pub use http_client::{HttpClient, HttpClientError, PreparedRequest};
pub use mocks::{MockError, MockServer};
pub use output::{OutputSink, SinkError};
pub use test_handler::{ExecuteTest, TestHandler};
pub use test_loader::{LoaderError, TestLoader};
