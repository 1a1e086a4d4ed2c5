//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0)
//! - Reject unknown log levels
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PropmapConfig → Result<(), Vec<ValidationError>>
//! - A zero-sized arena is valid: every allocation then overflows

use std::fmt;

use crate::config::schema::PropmapConfig;
use crate::observability::logging::{parse_log_level, LEVEL_NAMES};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint on `config`.
pub fn validate_config(config: &PropmapConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let map = &config.map;

    if map.max_line_length == 0 {
        errors.push(ValidationError::new("map.max_line_length", "must be greater than 0"));
    }
    if map.recursion_limit == 0 {
        errors.push(ValidationError::new("map.recursion_limit", "must be greater than 0"));
    }
    if map.substitution_limit == 0 {
        errors.push(ValidationError::new("map.substitution_limit", "must be greater than 0"));
    }
    if parse_log_level(&config.observability.log_level).is_none() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!(
                "unknown level '{}', expected one of {}",
                config.observability.log_level,
                LEVEL_NAMES.join(", ")
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&PropmapConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = PropmapConfig::default();
        config.map.arena_bytes = 0;
        config.map.recursion_limit = 0;
        config.map.substitution_limit = 0;
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["map.recursion_limit", "map.substitution_limit", "observability.log_level"]
        );
    }
}
