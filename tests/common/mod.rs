//! Shared utilities for integration testing.

use std::fs;
use std::path::{Path, PathBuf};

/// A properties file in the temp directory, removed on drop.
pub struct TempProperties {
    path: PathBuf,
}

impl TempProperties {
    /// Write `content` to a file unique to this process and `name`.
    pub fn new(name: &str, content: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "propmap-{}-{}.properties",
            std::process::id(),
            name
        ));
        fs::write(&path, content).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file contents.
    #[allow(dead_code)]
    pub fn rewrite(&self, content: &str) {
        fs::write(&self.path, content).unwrap();
    }
}

impl Drop for TempProperties {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Agent configuration exercising substitution and references together.
#[allow(dead_code)]
pub const WORKERS: &str = "\
# Shared defaults
worker.template.type=ajp13
worker.template.host=localhost
worker.template.socket_timeout=10

worker.list=node1, node2

worker.node1.reference=worker.template
worker.node1.port=8009

worker.node2.reference=worker.template
worker.node2.host=backend.internal
worker.node2.port=$(worker.node1.port)

connection.pool.size=2k
";
