//! Properties file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::schema::PropmapConfig;
use crate::loader::{is_stale, load_properties};
use crate::map::PropertyMap;

/// A watcher that reloads a properties file whenever it changes.
pub struct PropertiesWatcher {
    path: PathBuf,
    config: PropmapConfig,
    last_modified: Option<SystemTime>,
    update_tx: mpsc::UnboundedSender<PropertyMap>,
}

impl PropertiesWatcher {
    /// Create a new PropertiesWatcher.
    ///
    /// Returns the watcher and a receiver for freshly loaded maps.
    pub fn new(path: &Path, config: PropmapConfig) -> (Self, mpsc::UnboundedReceiver<PropertyMap>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                config,
                last_modified: None,
                update_tx,
            },
            update_rx,
        )
    }

    /// Skip change events that do not move the file past `modified`.
    ///
    /// Only the initial load sets this floor: a single rewrite can raise
    /// several events within one timestamp tick, and each must reload.
    pub fn since(mut self, modified: Option<SystemTime>) -> Self {
        self.last_modified = modified;
        self
    }

    /// Start watching the file in a background thread.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            config,
            last_modified,
            update_tx: tx,
        } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    if let Some(since) = last_modified {
                        if !is_stale(&path, since).unwrap_or(true) {
                            tracing::debug!(
                                path = ?path,
                                "Properties file unchanged, skipping reload"
                            );
                            return;
                        }
                    }

                    tracing::info!("Properties file change detected, reloading...");
                    match load_properties(&path, &config) {
                        Ok((map, _)) => {
                            let _ = tx.send(map);
                        }
                        Err(e) => {
                            tracing::error!(
                                "Failed to reload properties: {}. Keeping current map.",
                                e
                            );
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watched, "Properties watcher started");
        Ok(watcher)
    }
}
