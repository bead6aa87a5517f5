// Per-build state

use crate::bundle::render;
use crate::chunk::{assemble_chunk, Chunk};
use crate::compiler::AssetPathData;
use crate::config::CompilerOptions;
use crate::error::BundleError;
use crate::graph::{GraphBuilder, Module, ModuleGraph};
use crate::hooks::CompilationHooks;
use crate::loaders::LoaderRegistry;
use crate::resolve::Resolver;
use indexmap::IndexMap;
use std::path::{Component, Path};
use std::sync::Arc;

/// State of one build run
///
/// Created fresh by every [`crate::Compiler::run`] and dropped at its end.
#[derive(Debug)]
pub struct Compilation {
    pub hooks: CompilationHooks,
    options: Arc<CompilerOptions>,
    resolver: Resolver,
    /// Entry name -> entry module id
    entries: IndexMap<String, String>,
    graph: ModuleGraph,
    chunks: Vec<Chunk>,
    /// Output path (relative to `output.path`) -> bundle text
    assets: IndexMap<String, String>,
    /// Chunk name -> asset path
    chunk_assets: IndexMap<String, String>,
    files: Vec<String>,
}

impl Compilation {
    pub fn new(options: Arc<CompilerOptions>) -> Self {
        let resolver = Resolver::new(&options.context, options.resolve.extensions.clone());
        Self {
            hooks: CompilationHooks::default(),
            options,
            resolver,
            entries: IndexMap::new(),
            graph: ModuleGraph::new(),
            chunks: Vec::new(),
            assets: IndexMap::new(),
            chunk_assets: IndexMap::new(),
            files: Vec::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Build every entry's module graph, then one chunk per entry
    ///
    /// Chunks are assembled only once all entries are built so that every
    /// chunk sees the final owner sets.
    pub fn build_entry_modules(&mut self, loaders: &LoaderRegistry) -> Result<(), BundleError> {
        let builder = GraphBuilder::new(&self.resolver, &self.options.module.rules, loaders);

        for (name, path) in &self.options.entry {
            let id = builder.build_entry(&mut self.graph, name, path)?;
            tracing::debug!(entry = %name, module = %id, "entry built");
            self.entries.insert(name.clone(), id);
        }

        for (name, id) in &self.entries {
            let Some(entry_module) = self.graph.get(id) else {
                continue;
            };
            let chunk = assemble_chunk(name, entry_module, self.graph.iter());
            self.chunks.push(chunk);
        }
        Ok(())
    }

    /// Render every chunk into an in-memory asset
    ///
    /// The file name comes from the output template and is then passed through
    /// the `assetPath` hook.
    pub fn create_assets(&mut self) -> Result<(), BundleError> {
        for chunk in &self.chunks {
            let source = render(chunk);
            let data = AssetPathData {
                chunk_name: chunk.name.clone(),
                filename: self.options.output.filename.clone(),
                output_path: self.options.output.path.clone(),
            };
            let filename = self.options.output.filename_for(&chunk.name);
            let path = self.hooks.asset_path.call(filename, &data)?;
            check_asset_name(&path)?;
            let taken_by = self
                .chunk_assets
                .iter()
                .find(|(_, existing)| **existing == path)
                .map(|(name, _)| name);
            if let Some(other) = taken_by {
                return Err(BundleError::InvalidAsset {
                    name: path,
                    reason: format!("chunks '{other}' and '{}' share this path", chunk.name),
                });
            }
            tracing::debug!(chunk = %chunk.name, asset = %path, bytes = source.len(), "rendered chunk");
            self.chunk_assets.insert(chunk.name.clone(), path.clone());
            self.assets.insert(path, source);
        }
        Ok(())
    }

    /// Add or replace an asset before it is written
    pub fn emit_asset(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.assets.insert(name.into(), source.into());
    }

    /// Write every asset below `output.path`, creating directories as needed
    ///
    /// All names are checked before the first file is written.
    pub(crate) fn write_assets(&mut self) -> Result<(), BundleError> {
        for name in self.assets.keys() {
            check_asset_name(name)?;
        }

        let output_path = &self.options.output.path;
        std::fs::create_dir_all(output_path).map_err(|e| BundleError::io(output_path, e))?;

        for (name, source) in &self.assets {
            let target = output_path.join(name);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| BundleError::io(parent, e))?;
            }
            std::fs::write(&target, source).map_err(|e| BundleError::io(&target, e))?;
            tracing::debug!(file = %target.display(), "emitted");
            self.files.push(name.clone());
        }
        Ok(())
    }

    pub fn entries(&self) -> &IndexMap<String, String> {
        &self.entries
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.graph.iter()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn assets(&self) -> &IndexMap<String, String> {
        &self.assets
    }

    /// Chunk name -> the asset path its bundle was rendered to
    pub fn chunk_assets(&self) -> &IndexMap<String, String> {
        &self.chunk_assets
    }

    /// Files written so far, relative to `output.path`
    pub fn files(&self) -> &[String] {
        &self.files
    }
}

/// Asset names must be relative paths that stay inside `output.path`
fn check_asset_name(name: &str) -> Result<(), BundleError> {
    let invalid = |reason: &str| BundleError::InvalidAsset {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.is_empty() {
        return Err(invalid("empty name"));
    }
    for component in Path::new(name).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("'..' leaves the output directory")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("absolute paths are not allowed"))
            }
        }
    }
    Ok(())
}
