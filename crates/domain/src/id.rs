//! ID generation utilities.

use uuid::Uuid;

/// Generates a new time-ordered identifier.
///
/// Test cases and report artifacts are keyed by UUID v7 so that
/// identifiers sort in creation order.
#[must_use]
pub fn generate_id() -> Uuid {
    Uuid::now_v7()
}
