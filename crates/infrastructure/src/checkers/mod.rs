//! Built-in checkers
//!
//! Registered by the harness in this order: body, headers, assertions,
//! then database when a connection is configured.

mod assertion;
mod body;
pub mod compare;
mod db;
mod header;

pub use assertion::AssertionChecker;
pub use body::BodyChecker;
pub use db::DbChecker;
pub use header::HeaderChecker;
