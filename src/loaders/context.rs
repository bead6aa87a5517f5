// Execution context handed to loaders

use serde::Serialize;
use std::path::PathBuf;

/// Module-scoped information available to a loader while it transforms source
///
/// This is read-only ambient information: the file being built, the project
/// root, and the entry whose traversal reached the file.
#[derive(Debug, Clone, Serialize)]
pub struct LoaderContext {
    /// Absolute path of the module being transformed
    pub resource_path: PathBuf,

    /// Root directory module ids are computed against
    pub root_path: PathBuf,

    /// Entry name that triggered this build
    pub entry_name: String,
}

impl LoaderContext {
    /// Create a new loader context
    pub fn new(resource_path: impl Into<PathBuf>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            resource_path: resource_path.into(),
            root_path: root_path.into(),
            entry_name: String::new(),
        }
    }

    /// Set the entry name
    pub fn with_entry(mut self, entry_name: impl Into<String>) -> Self {
        self.entry_name = entry_name.into();
        self
    }

    /// Path of the module as rules see it (forward slashes)
    pub fn resource(&self) -> String {
        crate::resolve::to_unix_path(&self.resource_path)
    }
}
