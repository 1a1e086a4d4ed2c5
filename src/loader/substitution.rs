//! `$(name)` variable substitution.
//!
//! # Responsibilities
//! - Expand `$(name)` tokens from the map, then from the environment
//! - Leave unknown tokens in place and keep scanning after them
//! - Bound the number of expansions per value
//!
//! # Design Decisions
//! - Every splice builds a fresh string; the input is never modified
//! - Spliced text is not re-scanned, so a value cannot expand itself
//! - Hitting the expansion ceiling returns the partial result, not an error

use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::map::PropertyMap;
use crate::observability::metrics;

/// Lookup source consulted after the map itself.
pub trait VariableSource {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// The process environment.
///
/// Tries the UTF-8 view first and falls back to a lossy conversion of the
/// raw OS value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VariableSource for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        if name.is_empty() || name.contains(['=', '\0']) {
            return None;
        }
        std::env::var(name)
            .ok()
            .or_else(|| std::env::var_os(name).map(|v| v.to_string_lossy().into_owned()))
    }
}

impl<S: BuildHasher> VariableSource for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl PropertyMap {
    /// Expand `$(name)` tokens in `value` against the map and the process
    /// environment.
    pub fn replace_variables(&self, value: &str) -> String {
        self.replace_variables_with(value, &ProcessEnv)
    }

    /// Expand `$(name)` tokens in `value` against the map and `env`.
    pub fn replace_variables_with(&self, value: &str, env: &dyn VariableSource) -> String {
        let limit = self.limits().substitution_limit;
        let mut current = value.to_string();
        let mut scan = 0;
        let mut attempts = 0;

        while let Some(found) = current[scan..].find("$(") {
            let start = scan + found;
            if attempts == limit {
                tracing::error!(
                    limit,
                    value,
                    "Substitution limit reached, returning partial value"
                );
                metrics::record_substitution("limit");
                break;
            }
            attempts += 1;

            let Some(close) = current[start..].find(')') else {
                break;
            };
            let end = start + close;
            let name = &current[start + 2..end];

            let replacement = self
                .get_str(name)
                .map(str::to_string)
                .or_else(|| env.lookup(name));

            match replacement {
                Some(text) => {
                    let mut spliced = String::with_capacity(current.len() + text.len());
                    spliced.push_str(&current[..start]);
                    spliced.push_str(&text);
                    spliced.push_str(&current[end + 1..]);
                    scan = start + text.len();
                    current = spliced;
                    metrics::record_substitution("resolved");
                }
                None => {
                    tracing::debug!(name, "Unresolved variable left in place");
                    metrics::record_substitution("unresolved");
                    scan = end;
                }
            }
        }

        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Limits, PropertyMap};
    use crate::arena::Arena;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_map_then_environment() {
        let mut map = PropertyMap::new();
        map.put_str("host", "example.com").unwrap();
        let env = env(&[("HOME", "/root"), ("host", "ignored")]);

        let out = map.replace_variables_with("http://$(host)/$(HOME)", &env);
        assert_eq!(out, "http://example.com//root");
    }

    #[test]
    fn test_unknown_token_left_in_place() {
        let map = PropertyMap::new();
        let env = env(&[("B", "bee")]);
        let out = map.replace_variables_with("$(A)-$(B)-$(A)", &env);
        assert_eq!(out, "$(A)-bee-$(A)");
    }

    #[test]
    fn test_replacement_not_rescanned() {
        let mut map = PropertyMap::new();
        map.put_str("loop", "$(loop)").unwrap();
        let out = map.replace_variables_with("x$(loop)y", &env(&[]));
        assert_eq!(out, "x$(loop)y");
    }

    #[test]
    fn test_unclosed_token() {
        let map = PropertyMap::new();
        assert_eq!(map.replace_variables_with("a$(b", &env(&[])), "a$(b");
    }

    #[test]
    fn test_expansion_limit_returns_partial() {
        let limits = Limits {
            substitution_limit: 2,
            ..Limits::default()
        };
        let mut map = PropertyMap::with_arena(Arena::default(), limits);
        map.put_str("v", "1").unwrap();

        let out = map.replace_variables_with("$(v)$(v)$(v)", &env(&[]));
        assert_eq!(out, "11$(v)");
    }

    #[test]
    fn test_default_limit_is_twenty() {
        let mut map = PropertyMap::new();
        map.put_str("v", "x").unwrap();
        let input = "$(v)".repeat(25);
        let out = map.replace_variables_with(&input, &env(&[]));
        assert_eq!(out, format!("{}{}", "x".repeat(20), "$(v)".repeat(5)));
    }

    #[test]
    fn test_process_env_rejects_invalid_names() {
        assert_eq!(ProcessEnv.lookup(""), None);
        assert_eq!(ProcessEnv.lookup("A=B"), None);
    }
}
