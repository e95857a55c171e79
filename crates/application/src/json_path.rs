//! Minimal JSON path queries
//!
//! Supports `$`, `$.field`, `$.field.nested`, `$.array[0]` and `$.array[*]`,
//! which is what captures and JSON path assertions need.

use serde_json::Value;
use thiserror::Error;

/// A malformed JSON path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JsonPathError {
    /// The path does not start at the root.
    #[error("JSON path `{0}` must start with '$'")]
    MissingRoot(String),

    /// An array index is not a number or `*`.
    #[error("invalid array index `{index}` in JSON path `{path}`")]
    InvalidIndex {
        /// Full path.
        path: String,
        /// Offending index.
        index: String,
    },
}

/// Queries `json` at `path`.
///
/// Returns `Ok(None)` when the path is well formed but does not exist in
/// the document. A `[*]` segment returns the whole array it is applied to.
///
/// # Errors
///
/// Returns an error if the path is malformed.
pub fn query(json: &Value, path: &str) -> Result<Option<Value>, JsonPathError> {
    let trimmed = path.trim();
    let Some(rest) = trimmed.strip_prefix('$') else {
        return Err(JsonPathError::MissingRoot(trimmed.to_string()));
    };
    let rest = rest.strip_prefix('.').unwrap_or(rest);

    let mut current = json;
    for segment in split_segments(rest) {
        let (name, index) = parse_array_access(&segment);
        if !name.is_empty() {
            match current.get(name) {
                Some(value) => current = value,
                None => return Ok(None),
            }
        }
        match index {
            None => {}
            Some("*") => return Ok(Some(current.clone())),
            Some(index) => {
                let idx: usize = index.parse().map_err(|_| JsonPathError::InvalidIndex {
                    path: trimmed.to_string(),
                    index: index.to_string(),
                })?;
                match current.get(idx) {
                    Some(value) => current = value,
                    None => return Ok(None),
                }
            }
        }
    }

    Ok(Some(current.clone()))
}

/// Renders a JSON value the way it is substituted into strings: strings
/// without quotes, everything else as compact JSON.
#[must_use]
pub fn to_plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Splits a path into segments, keeping bracketed indices attached.
fn split_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_bracket = false;

    for ch in path.chars() {
        match ch {
            '.' if !in_bracket => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            '[' => {
                in_bracket = true;
                current.push(ch);
            }
            ']' => {
                in_bracket = false;
                current.push(ch);
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Parses `field[0]` into `("field", Some("0"))` and `field` into `("field", None)`.
fn parse_array_access(segment: &str) -> (&str, Option<&str>) {
    match segment.find('[') {
        Some(start) if segment.ends_with(']') => (
            &segment[..start],
            Some(&segment[start + 1..segment.len() - 1]),
        ),
        _ => (segment, None),
    }
}
