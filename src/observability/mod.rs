//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! arena / map / loader / resolver produce:
//!     → tracing events (warnings for skipped lines, errors for failed
//!       references, debug for every stored property)
//!     → metrics counters (line outcomes, substitutions, references)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr, level from RUST_LOG or config)
//!     → any metrics recorder the host installs
//! ```
//!
//! # Design Decisions
//! - The library only emits; the binary owns subscriber setup
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
