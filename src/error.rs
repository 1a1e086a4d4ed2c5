//! Error types shared by the arena, map, loader and resolver.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single map, loader or resolver operation.
///
/// A failed call never invalidates the rest of the map: entries written
/// before the failure stay in place.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// The arena could not satisfy an allocation of the given size.
    #[error("arena exhausted while allocating {0} bytes")]
    ArenaExhausted(usize),

    /// The entry table could not grow past its current capacity.
    #[error("entry table could not grow beyond {0} slots")]
    CapacityExhausted(usize),

    /// An arena text value from another map, or from before a reset.
    #[error("value for '{0}' is not live in this map's arena")]
    ForeignValue(String),

    /// A reference pointed at a group with no entries.
    #[error("reference '{0}' not found")]
    ReferenceNotFound(String),

    /// Reference chains nested deeper than the configured ceiling.
    #[error("recursion limit {limit} for references with prefix '{prefix}' reached")]
    RecursionLimit { limit: usize, prefix: String },

    /// The properties source could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = PropertyError> = std::result::Result<T, E>;
