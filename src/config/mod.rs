//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! propmap.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PropmapConfig (validated, immutable)
//!     → sizes the arena, bounds the loader and resolver
//!
//! On change of the watched properties file:
//!     watcher.rs detects change
//!     → properties reloaded into a fresh map and resolved
//!     → new map sent to the owner, which publishes it via SharedProperties
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A reload builds a new map; a published map is never mutated

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::MapConfig;
pub use schema::PropmapConfig;
pub use schema::ResolveConfig;
