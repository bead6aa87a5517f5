// Compiler - process-scoped configuration, hooks and the build driver

use crate::chunk::Chunk;
use crate::compilation::Compilation;
use crate::config::CompilerOptions;
use crate::error::BundleError;
use crate::graph::Module;
use crate::hooks::CompilerHooks;
use crate::loaders::LoaderRegistry;
use crate::plugins::Plugin;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Parameters passed to `compilation` taps
#[derive(Debug, Clone, Serialize)]
pub struct CompilationParams {
    pub context: PathBuf,
    pub output_path: PathBuf,
}

/// Data passed alongside the path through the `assetPath` waterfall
#[derive(Debug, Clone, Serialize)]
pub struct AssetPathData {
    /// Name of the chunk being emitted
    pub chunk_name: String,
    /// The unsubstituted filename template
    pub filename: String,
    /// Output directory assets are written to
    pub output_path: PathBuf,
}

/// Summary of a finished build
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    /// Entry name -> entry module id
    pub entries: IndexMap<String, String>,
    pub modules: Vec<Module>,
    pub chunks: Vec<Chunk>,
    /// Written files, relative to the output directory
    pub files: Vec<String>,
    /// Asset path -> bundle text
    pub assets: IndexMap<String, String>,
}

impl Stats {
    fn from_compilation(compilation: &Compilation) -> Self {
        Self {
            entries: compilation.entries().clone(),
            modules: compilation.modules().cloned().collect(),
            chunks: compilation.chunks().to_vec(),
            files: compilation.files().to_vec(),
            assets: compilation.assets().clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Owns normalized options, the loader registry and the compiler hooks
///
/// Lives for the process; every [`Compiler::run`] creates a fresh
/// [`Compilation`].
#[derive(Debug)]
pub struct Compiler {
    pub hooks: CompilerHooks,
    options: Arc<CompilerOptions>,
    loaders: LoaderRegistry,
}

impl Compiler {
    /// Validate `options` and check every loader named by a rule is registered
    pub fn new(options: CompilerOptions, loaders: LoaderRegistry) -> Result<Self, BundleError> {
        options.validate()?;
        loaders.validate(&options.module.rules)?;
        Ok(Self {
            hooks: CompilerHooks::default(),
            options: Arc::new(options),
            loaders,
        })
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    /// Let a plugin register its taps
    pub fn apply(&mut self, plugin: &dyn Plugin) -> Result<(), BundleError> {
        tracing::debug!(plugin = plugin.name(), "applying plugin");
        plugin.apply(self).map_err(|e| BundleError::Plugin {
            name: plugin.name().to_string(),
            message: format!("{e:#}"),
        })
    }

    /// Run one build
    ///
    /// Nothing is written unless every module builds and every hook up to
    /// `emit` succeeds.
    pub fn run(&self) -> Result<Stats, BundleError> {
        tracing::info!(
            context = %self.options.context.display(),
            entries = self.options.entry.len(),
            "build started"
        );
        self.hooks.run.call(self)?;

        let mut compilation = Compilation::new(Arc::clone(&self.options));
        let params = CompilationParams {
            context: self.options.context.clone(),
            output_path: self.options.output.path.clone(),
        };
        self.hooks.compilation.call(&mut compilation, &params)?;

        compilation.build_entry_modules(&self.loaders)?;
        compilation.create_assets()?;
        self.hooks.emit.call(&mut compilation)?;
        compilation.write_assets()?;

        let stats = Stats::from_compilation(&compilation);
        self.hooks.done.call(&stats)?;

        tracing::info!(
            modules = stats.modules.len(),
            chunks = stats.chunks.len(),
            files = stats.files.len(),
            "build finished"
        );
        Ok(stats)
    }
}
