// Module records and the per-build module set

pub mod builder;

pub use builder::GraphBuilder;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One resolved, transformed source file
///
/// Everything but `owning_entries` is fixed once the module is built.
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    id: String,
    #[serde(skip)]
    path: PathBuf,
    owning_entries: IndexSet<String>,
    dependencies: IndexSet<String>,
    #[serde(skip)]
    raw_source: String,
    #[serde(skip)]
    transformed_source: String,
}

impl Module {
    pub fn new(
        id: impl Into<String>,
        path: impl Into<PathBuf>,
        entry: impl Into<String>,
        raw_source: String,
        transformed_source: String,
    ) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            owning_entries: IndexSet::from([entry.into()]),
            dependencies: IndexSet::new(),
            raw_source,
            transformed_source,
        }
    }

    pub(crate) fn with_dependencies<I>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.dependencies.extend(dependencies);
        self
    }

    /// Canonical id, e.g. `./src/index.js`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute path the module was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry names that transitively require this module, in discovery order
    pub fn owning_entries(&self) -> &IndexSet<String> {
        &self.owning_entries
    }

    pub fn is_owned_by(&self, entry: &str) -> bool {
        self.owning_entries.contains(entry)
    }

    /// Ids this module requires, in source order
    pub fn dependencies(&self) -> &IndexSet<String> {
        &self.dependencies
    }

    pub fn raw_source(&self) -> &str {
        &self.raw_source
    }

    /// Source after loaders and require rewriting
    pub fn transformed_source(&self) -> &str {
        &self.transformed_source
    }

    /// Returns false when `entry` was already an owner
    pub(crate) fn add_owner(&mut self, entry: &str) -> bool {
        if self.owning_entries.contains(entry) {
            return false;
        }
        self.owning_entries.insert(entry.to_string())
    }
}

/// Every module built during one compilation, keyed by id in insertion order
#[derive(Debug, Default, Clone)]
pub struct ModuleGraph {
    modules: IndexMap<String, Module>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly built module; an existing id is left untouched
    pub fn insert(&mut self, module: Module) -> bool {
        if self.modules.contains_key(module.id()) {
            return false;
        }
        self.modules.insert(module.id.clone(), module);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Module> {
        self.modules.get(id)
    }

    /// Modules in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Tag `id` and everything it transitively requires with `entry`
    ///
    /// Stops at modules that already carry the name, so a cycle or an
    /// already-tagged subgraph is visited at most once.
    pub fn add_owner(&mut self, id: &str, entry: &str) {
        let mut stack = vec![id.to_string()];
        while let Some(next) = stack.pop() {
            let Some(module) = self.modules.get_mut(&next) else {
                continue;
            };
            if module.add_owner(entry) {
                stack.extend(module.dependencies.iter().rev().cloned());
            }
        }
    }
}
