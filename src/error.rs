// Error types for the bundler

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for a build
///
/// Every variant is fatal to the current run: nothing is written once one of
/// these surfaces. Configuration problems are exposed through the `From`
/// conversion from [`ConfigError`].
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Module not found: Can't resolve '{specifier}' in '{base_dir}'")]
    ModuleNotFound { specifier: String, base_dir: PathBuf },

    #[error("Parse error in {module} at {location}: {message}")]
    Parse {
        module: String,
        location: Location,
        message: String,
    },

    #[error("Loader '{loader}' failed on {module}: {message}")]
    Transform {
        loader: String,
        module: String,
        message: String,
    },

    #[error("Unsupported require() in {module} at {location}: the argument must be a string literal")]
    DynamicRequire { module: String, location: Location },

    #[error("Loader '{name}' is not registered")]
    UnknownLoader { name: String },

    #[error("Hook '{hook}' tap '{tap}' failed: {message}")]
    Hook {
        hook: &'static str,
        tap: String,
        message: String,
    },

    #[error("Invalid asset '{name}': {reason}")]
    InvalidAsset { name: String, reason: String },

    #[error("Plugin '{name}' failed to apply: {message}")]
    Plugin { name: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BundleError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors while loading or normalizing configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("TOML parsing error in {path}: {error}")]
    Toml { path: PathBuf, error: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid rule test '{pattern}': {error}")]
    InvalidRule { pattern: String, error: String },

    #[error("Unknown plugin '{0}'")]
    UnknownPlugin(String),
}

/// 1-based position inside a module's (loader-transformed) source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Compute the line/column of a byte offset
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
