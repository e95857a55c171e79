//! Variable resolution engine
//!
//! Resolves `{{variable}}` references according to precedence rules:
//! built-ins, then test-level variables, then values captured by earlier
//! tests, then run-level variables.

use std::collections::{BTreeMap, HashMap};

use gauntlet_domain::TestCase;
use serde_json::Value;

use super::builtins::BuiltinVariables;
use super::parser::parse_variables;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableScope {
    /// A generated `$` variable.
    BuiltIn,
    /// The test case's own `variables`.
    Test,
    /// Captured from the response of an earlier test case.
    Captured,
    /// Supplied for the whole run.
    Run,
}

/// A variable reference that was substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariable {
    /// Variable name.
    pub name: String,
    /// Substituted value.
    pub value: String,
    /// Scope the value was taken from.
    pub scope: VariableScope,
}

/// Result of variable resolution for a string.
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    /// The resolved string with all known variables substituted.
    pub resolved: String,

    /// Variables that were successfully resolved.
    pub resolved_variables: Vec<ResolvedVariable>,

    /// Variable names that could not be resolved. Their placeholders are
    /// kept verbatim in `resolved`.
    pub unresolved: Vec<String>,
}

impl ResolutionResult {
    /// Creates a result for input with no variables.
    #[must_use]
    pub fn no_variables(input: &str) -> Self {
        Self {
            resolved: input.to_string(),
            resolved_variables: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    /// Whether every reference was resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Resolves placeholders for one test case.
///
/// Create one resolver per test case: built-in values are cached for its
/// lifetime so `{{$uuid}}` is the same in the path and the body.
pub struct VariableResolver<'a> {
    test: &'a BTreeMap<String, String>,
    captured: &'a BTreeMap<String, String>,
    run: &'a BTreeMap<String, String>,
    builtin_cache: HashMap<String, String>,
}

impl<'a> VariableResolver<'a> {
    /// Creates a resolver over the three user scopes.
    #[must_use]
    pub fn new(
        test: &'a BTreeMap<String, String>,
        captured: &'a BTreeMap<String, String>,
        run: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            test,
            captured,
            run,
            builtin_cache: HashMap::new(),
        }
    }

    /// Resolves all variables in the input string.
    pub fn resolve(&mut self, input: &str) -> ResolutionResult {
        let references = parse_variables(input);

        if references.is_empty() {
            return ResolutionResult::no_variables(input);
        }

        let mut resolved_variables = Vec::new();
        let mut unresolved = Vec::new();
        let mut result = String::with_capacity(input.len());
        let mut last_end = 0;

        for var_ref in &references {
            result.push_str(&input[last_end..var_ref.span.start]);

            if let Some(resolved) = self.resolve_variable(&var_ref.name) {
                result.push_str(&resolved.value);
                resolved_variables.push(resolved);
            } else {
                result.push_str(&input[var_ref.span.clone()]);
                unresolved.push(var_ref.name.clone());
            }

            last_end = var_ref.span.end;
        }

        result.push_str(&input[last_end..]);

        ResolutionResult {
            resolved: result,
            resolved_variables,
            unresolved,
        }
    }

    /// Returns a copy of the test case with every placeholder in the request
    /// and in the expected body and headers substituted, together with the
    /// names that stayed unresolved.
    pub fn resolve_test_case(&mut self, test: &TestCase) -> (TestCase, Vec<String>) {
        let mut unresolved = Vec::new();
        let mut resolved = test.clone();

        let mut apply = |value: &mut String, resolver: &mut Self| {
            let result = resolver.resolve(value);
            unresolved.extend(result.unresolved);
            *value = result.resolved;
        };

        apply(&mut resolved.request.path, self);
        for value in resolved.request.query.values_mut() {
            apply(value, self);
        }
        for value in resolved.request.headers.values_mut() {
            apply(value, self);
        }
        if let Some(body) = resolved.request.body.as_mut() {
            apply(body, self);
        }
        if let Some(body) = resolved.expect.body.as_mut() {
            apply(body, self);
        }
        for value in resolved.expect.headers.values_mut() {
            apply(value, self);
        }
        for definition in resolved.mocks.values_mut() {
            resolve_strings(definition, &mut |value| apply(value, self));
        }

        unresolved.sort();
        unresolved.dedup();
        (resolved, unresolved)
    }

    fn resolve_variable(&mut self, name: &str) -> Option<ResolvedVariable> {
        if name.starts_with('$') {
            let value = if let Some(cached) = self.builtin_cache.get(name) {
                cached.clone()
            } else {
                let generated = BuiltinVariables::resolve(name)?;
                self.builtin_cache
                    .insert(name.to_string(), generated.clone());
                generated
            };
            return Some(ResolvedVariable {
                name: name.to_string(),
                value,
                scope: VariableScope::BuiltIn,
            });
        }

        let (value, scope) = if let Some(value) = self.test.get(name) {
            (value, VariableScope::Test)
        } else if let Some(value) = self.captured.get(name) {
            (value, VariableScope::Captured)
        } else {
            (self.run.get(name)?, VariableScope::Run)
        };

        Some(ResolvedVariable {
            name: name.to_string(),
            value: value.clone(),
            scope,
        })
    }
}

/// Applies `apply` to every string inside a JSON document.
fn resolve_strings(value: &mut Value, apply: &mut impl FnMut(&mut String)) {
    match value {
        Value::String(text) => apply(text),
        Value::Array(items) => items.iter_mut().for_each(|item| resolve_strings(item, apply)),
        Value::Object(fields) => fields
            .values_mut()
            .for_each(|field| resolve_strings(field, apply)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
