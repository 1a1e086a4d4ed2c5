//! Arena-backed property maps for hierarchical agent configuration.
//!
//! Text in `key = value` form is loaded into a [`PropertyMap`], `$(name)`
//! variables are expanded, and `<group>.reference = <other>` entries let
//! one group inherit every key it does not set itself.
//!
//! ```
//! use propmap::{PropertyMap, Treatment};
//!
//! let text = "\
//! worker.base.port = 8009
//! worker.web.reference = worker.base
//! worker.web.host = web.local
//! ";
//! let mut map = PropertyMap::new();
//! map.read_properties_from(text.as_bytes(), Treatment::Raw).unwrap();
//! map.resolve_references("worker.", true, 0).unwrap();
//!
//! assert_eq!(map.get_int("worker.web.port", 0), 8009);
//! ```

pub mod arena;
pub mod config;
pub mod error;
pub mod loader;
pub mod map;
pub mod observability;
pub mod resolver;

pub use arena::{Arena, ArenaStr};
pub use config::PropmapConfig;
pub use error::PropertyError;
pub use loader::{LineOutcome, LoadReport, Treatment};
pub use map::shared::SharedProperties;
pub use map::{PropertyMap, Value};
