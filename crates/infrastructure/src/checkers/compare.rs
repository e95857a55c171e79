//! Structural JSON comparison
//!
//! Shared by the body and database checkers. Expected values drive the walk:
//! every expected field and element must be present in the actual value.

use gauntlet_domain::{CompareOptions, Diagnostic};
use regex::Regex;
use serde_json::Value;

const REGEX_PREFIX: &str = "$matchRegexp(";

/// Returns the pattern of a `$matchRegexp(<re>)` marker.
pub fn regex_marker(expected: &str) -> Option<&str> {
    expected
        .strip_prefix(REGEX_PREFIX)
        .and_then(|rest| rest.strip_suffix(')'))
}

/// Matches `actual` against a plain expected string or a regex marker.
///
/// Returns `Err` with the compile error if the marker holds an invalid regex.
pub fn matches_text(expected: &str, actual: &str) -> Result<bool, regex::Error> {
    match regex_marker(expected) {
        Some(pattern) => Ok(Regex::new(pattern)?.is_match(actual)),
        None => Ok(expected == actual),
    }
}

/// Compares two JSON documents and returns one diagnostic per mismatch,
/// tagged with `checker` and anchored at a `$`-rooted path.
pub fn compare_json(
    checker: &str,
    expected: &Value,
    actual: &Value,
    options: CompareOptions,
) -> Vec<Diagnostic> {
    let mut comparer = Comparer {
        checker,
        options,
        diagnostics: Vec::new(),
    };
    comparer.compare("$", expected, actual);
    comparer.diagnostics
}

/// Returns true if the documents match under `options`.
pub fn json_matches(expected: &Value, actual: &Value, options: CompareOptions) -> bool {
    compare_json("", expected, actual, options).is_empty()
}

struct Comparer<'a> {
    checker: &'a str,
    options: CompareOptions,
    diagnostics: Vec<Diagnostic>,
}

impl Comparer<'_> {
    fn report(&mut self, path: &str, message: String) {
        self.diagnostics
            .push(Diagnostic::at(self.checker, path, message));
    }

    fn compare(&mut self, path: &str, expected: &Value, actual: &Value) {
        if let Value::String(text) = expected
            && let Some(pattern) = regex_marker(text)
        {
            self.compare_regex(path, pattern, actual);
            return;
        }

        match (expected, actual) {
            (Value::Object(expected), Value::Object(actual)) => {
                for (key, value) in expected {
                    let child = format!("{path}.{key}");
                    match actual.get(key) {
                        Some(actual_value) => self.compare(&child, value, actual_value),
                        None => self.report(&child, "field is missing".to_string()),
                    }
                }
                if self.options.disallow_extra_fields {
                    for key in actual.keys().filter(|k| !expected.contains_key(*k)) {
                        self.report(&format!("{path}.{key}"), "unexpected field".to_string());
                    }
                }
            }
            (Value::Array(expected), Value::Array(actual)) => {
                if expected.len() != actual.len() {
                    self.report(
                        path,
                        format!(
                            "array length differs: expected {}, got {}",
                            expected.len(),
                            actual.len()
                        ),
                    );
                    return;
                }
                if self.options.ignore_array_order {
                    self.compare_unordered(path, expected, actual);
                } else {
                    for (i, (e, a)) in expected.iter().zip(actual).enumerate() {
                        self.compare(&format!("{path}[{i}]"), e, a);
                    }
                }
            }
            _ if type_name(expected) != type_name(actual) => self.report(
                path,
                format!(
                    "type mismatch: expected {}, got {}",
                    type_name(expected),
                    type_name(actual)
                ),
            ),
            _ if !self.options.ignore_values && expected != actual => {
                self.report(path, format!("expected {expected}, got {actual}"));
            }
            _ => {}
        }
    }

    fn compare_regex(&mut self, path: &str, pattern: &str, actual: &Value) {
        let text = match actual {
            Value::String(s) => s.clone(),
            Value::Number(_) | Value::Bool(_) => actual.to_string(),
            _ => {
                self.report(
                    path,
                    format!("expected a value matching /{pattern}/, got {}", type_name(actual)),
                );
                return;
            }
        };
        match Regex::new(pattern) {
            Ok(re) if re.is_match(&text) => {}
            Ok(_) => self.report(path, format!("value {actual} does not match /{pattern}/")),
            Err(e) => self.report(path, format!("invalid regex /{pattern}/: {e}")),
        }
    }

    /// Each expected element must match a distinct actual element.
    ///
    /// Elements are paired by maximum bipartite matching, so a loose expected
    /// element never takes the only candidate a stricter one could use.
    fn compare_unordered(&mut self, path: &str, expected: &[Value], actual: &[Value]) {
        let candidates: Vec<Vec<usize>> = expected
            .iter()
            .map(|e| {
                (0..actual.len())
                    .filter(|&j| json_matches(e, &actual[j], self.options))
                    .collect()
            })
            .collect();

        let mut owner: Vec<Option<usize>> = vec![None; actual.len()];
        for i in 0..expected.len() {
            let mut visited = vec![false; actual.len()];
            augment(i, &candidates, &mut owner, &mut visited);
        }

        let mut matched = vec![false; expected.len()];
        for i in owner.into_iter().flatten() {
            matched[i] = true;
        }
        for (i, e) in expected.iter().enumerate() {
            if !matched[i] {
                self.report(&format!("{path}[{i}]"), format!("no matching element for {e}"));
            }
        }
    }
}

/// Tries to pair expected element `i`, re-pairing earlier ones when needed.
fn augment(
    i: usize,
    candidates: &[Vec<usize>],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &j in &candidates[i] {
        if visited[j] {
            continue;
        }
        visited[j] = true;
        let current = owner[j];
        if current.is_none_or(|other| augment(other, candidates, owner, visited)) {
            owner[j] = Some(i);
            return true;
        }
    }
    false
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
