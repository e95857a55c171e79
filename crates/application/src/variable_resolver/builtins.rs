//! Built-in dynamic variables
//!
//! These variables are prefixed with `$`. The resolver generates each one at
//! most once per test case, so repeated references agree.

use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;
use uuid::Uuid;

/// Generates values for built-in dynamic variables.
pub struct BuiltinVariables;

impl BuiltinVariables {
    /// Every recognised built-in name.
    pub const NAMES: &'static [&'static str] = &[
        "$uuid",
        "$timestamp",
        "$isoTimestamp",
        "$randomInt",
        "$randomString",
        "$randomEmail",
        "$date",
    ];

    /// Generates a fresh value for a built-in variable.
    /// Returns None if the name is not a recognised built-in.
    #[must_use]
    pub fn resolve(name: &str) -> Option<String> {
        match name {
            "$uuid" => Some(Uuid::new_v4().to_string()),
            "$timestamp" => Some(Utc::now().timestamp().to_string()),
            "$isoTimestamp" => Some(Utc::now().to_rfc3339()),
            "$randomInt" => Some(rand::rng().random_range(0..=1000).to_string()),
            "$randomString" => Some(random_alphanumeric(16)),
            "$randomEmail" => Some(format!(
                "{}@example.com",
                random_alphanumeric(8).to_lowercase()
            )),
            "$date" => Some(Utc::now().format("%Y-%m-%d").to_string()),
            _ => None,
        }
    }

    /// Returns whether the name is a recognised built-in.
    #[must_use]
    pub fn is_builtin(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }
}

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_generation() {
        let uuid = BuiltinVariables::resolve("$uuid").expect("Should resolve $uuid");
        assert!(Uuid::parse_str(&uuid).is_ok());
    }

    #[test]
    fn test_timestamp_generation() {
        let ts = BuiltinVariables::resolve("$timestamp").unwrap();
        let parsed: i64 = ts.parse().expect("Should be valid integer");
        assert!(parsed > 0);
    }

    #[test]
    fn test_random_int_in_range() {
        let value: i32 = BuiltinVariables::resolve("$randomInt")
            .unwrap()
            .parse()
            .unwrap();
        assert!((0..=1000).contains(&value));
    }

    #[test]
    fn test_random_string_generation() {
        let s = BuiltinVariables::resolve("$randomString").unwrap();
        assert_eq!(s.len(), 16);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_every_listed_name_resolves() {
        for name in BuiltinVariables::NAMES {
            assert!(BuiltinVariables::resolve(name).is_some(), "{name}");
        }
        assert!(!BuiltinVariables::is_builtin("$unknown"));
        assert!(BuiltinVariables::resolve("$unknown").is_none());
    }
}
