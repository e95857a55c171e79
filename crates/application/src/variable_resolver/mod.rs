//! Variable resolution module
//!
//! Provides parsing and resolution of `{{variable}}` placeholders in test
//! case requests and expectations.
//!
//! # Usage
//!
//! ```
//! use std::collections::BTreeMap;
//! use gauntlet_application::variable_resolver::VariableResolver;
//!
//! let run = BTreeMap::from([("host".to_string(), "localhost".to_string())]);
//! let empty = BTreeMap::new();
//! let mut resolver = VariableResolver::new(&empty, &empty, &run);
//!
//! let result = resolver.resolve("http://{{host}}/api");
//! assert_eq!(result.resolved, "http://localhost/api");
//! ```

pub mod builtins;
pub mod engine;
pub mod parser;

pub use builtins::BuiltinVariables;
pub use engine::{ResolutionResult, ResolvedVariable, VariableResolver, VariableScope};
pub use parser::{VariableReference, has_variables, parse_variables};
