//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::PropmapConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<PropmapConfig, ConfigError> {
    let config: PropmapConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<PropmapConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Treatment;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config(
            r#"
            [map]
            arena_bytes = 128
            treatment = "raw"

            [resolve]
            prefix = "worker."
            "#,
        )
        .unwrap();

        assert_eq!(config.map.arena_bytes, 128);
        assert_eq!(config.map.treatment, Treatment::Raw);
        assert_eq!(config.map.recursion_limit, 20);
        assert_eq!(config.resolve.prefix, "worker.");
        assert!(config.resolve.wildcard);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = parse_config("[map]\nmax_line_length = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));
        assert!(err.to_string().contains("map.max_line_length"));

        assert!(matches!(
            parse_config("[map]\ntreatment = \"strict\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config(Path::new("/nonexistent/propmap.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
