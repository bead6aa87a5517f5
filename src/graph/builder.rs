// Module graph construction

use super::{Module, ModuleGraph};
use crate::config::Rule;
use crate::error::BundleError;
use crate::loaders::{apply_loaders, LoaderContext, LoaderRegistry};
use crate::resolve::Resolver;
use crate::transform::rewrite_requires;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Builds modules for one entry at a time into a shared [`ModuleGraph`]
pub struct GraphBuilder<'c> {
    resolver: &'c Resolver,
    rules: &'c [Rule],
    loaders: &'c LoaderRegistry,
}

impl<'c> GraphBuilder<'c> {
    pub fn new(resolver: &'c Resolver, rules: &'c [Rule], loaders: &'c LoaderRegistry) -> Self {
        Self {
            resolver,
            rules,
            loaders,
        }
    }

    /// Build `path` and everything it requires on behalf of `entry`
    ///
    /// Modules already in the graph are never rebuilt; they (and their
    /// dependencies) only gain `entry` as an owner. Each new module is inserted
    /// before its dependencies are visited, which is what makes cycles
    /// terminate. Returns the id of the module built from `path`.
    pub fn build_entry(
        &self,
        graph: &mut ModuleGraph,
        entry: &str,
        path: &Path,
    ) -> Result<String, BundleError> {
        let entry_id = self.resolver.module_id(path);
        let mut pending: Vec<(String, PathBuf)> = vec![(entry_id.clone(), path.to_path_buf())];

        while let Some((id, path)) = pending.pop() {
            if graph.contains(&id) {
                graph.add_owner(&id, entry);
                continue;
            }

            let (module, dependencies) = self.build_module(entry, &id, &path)?;
            graph.insert(module);

            // Reversed so the first require is built first.
            pending.extend(dependencies.into_iter().rev());
        }

        Ok(entry_id)
    }

    /// Read, run loaders over, and rewrite a single module
    ///
    /// Returns the module along with its dependencies' absolute paths.
    fn build_module(
        &self,
        entry: &str,
        id: &str,
        path: &Path,
    ) -> Result<(Module, IndexMap<String, PathBuf>), BundleError> {
        let raw_source = std::fs::read_to_string(path).map_err(|e| BundleError::io(path, e))?;

        let context = LoaderContext::new(path, self.resolver.root()).with_entry(entry);
        let loaded = apply_loaders(self.rules, self.loaders, &context, raw_source.clone())?;

        let output = rewrite_requires(&loaded, path, id, self.resolver)?;
        tracing::debug!(
            module = %id,
            entry,
            dependencies = output.dependencies.len(),
            "built module"
        );

        let module = Module::new(id, path, entry, raw_source, output.code)
            .with_dependencies(output.dependencies.keys().cloned());
        Ok((module, output.dependencies))
    }
}
