//! Configuration schema definitions.
//!
//! Settings for the property map itself, for reference resolution and for
//! logging. All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};

use crate::arena::DEFAULT_PRIMARY_SIZE;
use crate::loader::Treatment;
use crate::map::{
    Limits, DEFAULT_MAX_LINE_LENGTH, DEFAULT_RECURSION_LIMIT, DEFAULT_SUBSTITUTION_LIMIT,
};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct PropmapConfig {
    /// Arena sizing and parser limits.
    pub map: MapConfig,

    /// Reference resolution after loading.
    pub resolve: ResolveConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Arena sizing and parser limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    /// Size of the arena's primary buffer in bytes.
    pub arena_bytes: usize,

    /// Cap on heap overflow bytes (unbounded when absent).
    pub overflow_limit_bytes: Option<usize>,

    /// Longest accepted physical line.
    pub max_line_length: usize,

    /// Maximum reference nesting depth.
    pub recursion_limit: usize,

    /// Maximum `$(name)` expansions per value.
    pub substitution_limit: usize,

    /// Raw or interpreted values.
    pub treatment: Treatment,
}

impl MapConfig {
    pub fn limits(&self) -> Limits {
        Limits {
            max_line_length: self.max_line_length,
            recursion_limit: self.recursion_limit,
            substitution_limit: self.substitution_limit,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            arena_bytes: DEFAULT_PRIMARY_SIZE,
            overflow_limit_bytes: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            substitution_limit: DEFAULT_SUBSTITUTION_LIMIT,
            treatment: Treatment::Interpreted,
        }
    }
}

/// Reference resolution settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ResolveConfig {
    /// Resolve references after each load.
    pub enabled: bool,

    /// Only references under this prefix are followed.
    pub prefix: String,

    /// Follow references nested below the prefix.
    pub wildcard: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: String::new(),
            wildcard: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error, emerg).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
