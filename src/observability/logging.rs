//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Map configured level names onto tracing levels
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - Level names are case-insensitive; `emerg` is treated as `error`
//!   and unknown names fall back to `info`

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Known level names.
pub const LEVEL_NAMES: &[&str] = &["trace", "debug", "info", "warn", "error", "emerg"];

/// Parse a level name.
pub fn parse_log_level(level: &str) -> Option<Level> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" | "emerg" => Some(Level::ERROR),
        _ => None,
    }
}

/// Install the global subscriber.
///
/// Returns quietly if a subscriber is already installed.
pub fn init(log_level: &str) {
    let level = parse_log_level(log_level).unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("propmap={}", level.as_str().to_ascii_lowercase()).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_log_level("emerg"), Some(Level::ERROR));
        assert_eq!(parse_log_level("verbose"), None);
        for name in LEVEL_NAMES {
            assert!(parse_log_level(name).is_some());
        }
    }
}
