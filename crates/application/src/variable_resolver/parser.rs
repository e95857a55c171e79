//! Placeholder parser for `{{variable}}` syntax
//!
//! Parses strings to extract variable references with their positions.

use std::ops::Range;

/// A parsed `{{name}}` reference in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReference {
    /// The variable name, trimmed, without the braces.
    pub name: String,

    /// Whether this is a built-in variable (starts with `$`).
    pub is_builtin: bool,

    /// Byte range of the whole placeholder in the original string.
    pub span: Range<usize>,
}

impl VariableReference {
    /// Creates a new variable reference.
    #[must_use]
    pub fn new(name: impl Into<String>, span: Range<usize>) -> Self {
        let name = name.into();
        let is_builtin = name.starts_with('$');
        Self {
            name,
            is_builtin,
            span,
        }
    }
}

/// Parses a string and extracts all variable references, in order.
///
/// Supports `{{name}}`, `{{ name }}` and built-ins such as `{{$uuid}}`.
/// Empty placeholders and an unterminated trailing `{{` are ignored.
///
/// # Examples
///
/// ```
/// use gauntlet_application::variable_resolver::parse_variables;
///
/// let refs = parse_variables("/users/{{ user_id }}?trace={{$uuid}}");
/// assert_eq!(refs.len(), 2);
/// assert_eq!(refs[0].name, "user_id");
/// assert!(refs[1].is_builtin);
/// ```
#[must_use]
pub fn parse_variables(input: &str) -> Vec<VariableReference> {
    let mut references = Vec::new();
    let mut rest = 0;

    while let Some(open) = input[rest..].find("{{") {
        let start = rest + open;
        let body_start = start + 2;
        let Some(close) = input[body_start..].find("}}") else {
            break;
        };
        let end = body_start + close + 2;
        let name = input[body_start..body_start + close].trim();
        if !name.is_empty() {
            references.push(VariableReference::new(name, start..end));
        }
        rest = end;
    }

    references
}

/// Returns true if the input string contains at least one placeholder.
#[must_use]
pub fn has_variables(input: &str) -> bool {
    !parse_variables(input).is_empty()
}
