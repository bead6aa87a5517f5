//! tinypack - a small CommonJS module bundler
//!
//! Builds a module graph from one or more entries, rewrites `require` calls to
//! canonical module ids, groups modules into one chunk per entry and renders
//! each chunk into a self-executing bundle. Plugins observe and influence the
//! build through a fixed set of synchronous hooks.

pub mod bundle;
pub mod chunk;
pub mod cli;
pub mod compilation;
pub mod compiler;
pub mod config;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod loaders;
pub mod manifest;
pub mod plugins;
pub mod resolve;
pub mod transform;

pub use chunk::Chunk;
pub use compilation::Compilation;
pub use compiler::{AssetPathData, CompilationParams, Compiler, Stats};
pub use config::{CompilerOptions, Rule};
pub use error::{BundleError, ConfigError};
pub use graph::{Module, ModuleGraph};
pub use hooks::HookKind;
pub use loaders::{Loader, LoaderContext, LoaderRegistry};
pub use plugins::{Plugin, PluginRegistry};

/// Create a compiler and apply `plugins` to it in order
pub fn create_compiler(
    options: CompilerOptions,
    loaders: LoaderRegistry,
    plugins: &[Box<dyn Plugin>],
) -> Result<Compiler, BundleError> {
    let mut compiler = Compiler::new(options, loaders)?;
    for plugin in plugins {
        compiler.apply(plugin.as_ref())?;
    }
    Ok(compiler)
}
