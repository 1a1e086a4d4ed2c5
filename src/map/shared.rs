//! Guarded handle for sharing resolved maps across threads.
//!
//! [`PropertyMap`] has no internal locking. Once a map is fully loaded and
//! resolved it is frozen behind an `Arc` and published here; readers take
//! cheap snapshots while a reload swaps in a replacement map atomically.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::map::PropertyMap;

/// Atomically replaceable, read-only property map.
#[derive(Debug)]
pub struct SharedProperties {
    current: ArcSwap<PropertyMap>,
}

impl SharedProperties {
    pub fn new(map: PropertyMap) -> Self {
        Self {
            current: ArcSwap::from_pointee(map),
        }
    }

    /// Snapshot of the map currently published.
    pub fn load(&self) -> Arc<PropertyMap> {
        self.current.load_full()
    }

    /// Publish `map`, returning the map it replaced.
    pub fn store(&self, map: PropertyMap) -> Arc<PropertyMap> {
        let entries = map.len();
        let previous = self.current.swap(Arc::new(map));
        tracing::info!(entries, "Published new property map");
        previous
    }
}

impl Default for SharedProperties {
    fn default() -> Self {
        Self::new(PropertyMap::new())
    }
}
