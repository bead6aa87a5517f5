// Path resolution and canonical module ids

use crate::error::BundleError;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Normalize path separators to `/`
pub fn to_unix_path(path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

/// Lexically collapse `.` and `..` components, the way Node's `path.join` does
///
/// The filesystem is never consulted, so symlinks are not followed.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Relative path from `from` to `to`; both are expected to be absolute and normalized
pub fn relative(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<_> = from.components().collect();
    let to: Vec<_> = to.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for component in &to[common..] {
        out.push(component.as_os_str());
    }
    out
}

/// Canonical id of a module: its path relative to `root`, `./`-prefixed, forward slashes
///
/// Module identity is a pure function of the absolute path, so two requests
/// for the same file always land on the same id.
pub fn module_id(root: &Path, absolute: &Path) -> String {
    let rel = relative(&normalize(root), &normalize(absolute));
    format!("./{}", to_unix_path(rel))
}

/// Resolves import specifiers against the filesystem
#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
    extensions: Vec<String>,
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: normalize(root.into()),
            extensions,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical id for an absolute path under this resolver's root
    pub fn module_id(&self, absolute: &Path) -> String {
        module_id(&self.root, absolute)
    }

    /// Resolve `specifier` relative to `base_dir`
    ///
    /// The literal path is tried first, then each configured extension in
    /// order, appended to the joined path. Only regular files match.
    pub fn resolve(&self, base_dir: &Path, specifier: &str) -> Result<PathBuf, BundleError> {
        let joined = normalize(base_dir.join(specifier));

        let candidates = std::iter::once("").chain(self.extensions.iter().map(String::as_str));
        for extension in candidates {
            let mut candidate = OsString::from(joined.as_os_str());
            candidate.push(extension);
            let candidate = PathBuf::from(candidate);
            if candidate.is_file() {
                tracing::trace!(
                    specifier,
                    resolved = %candidate.display(),
                    "resolved request"
                );
                return Ok(candidate);
            }
        }

        Err(BundleError::ModuleNotFound {
            specifier: specifier.to_string(),
            base_dir: base_dir.to_path_buf(),
        })
    }
}
