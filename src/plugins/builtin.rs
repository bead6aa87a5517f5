// Built-in plugins

use super::Plugin;
use crate::compiler::Compiler;
use serde::Deserialize;
use serde_json::Value;

/// Logs the build lifecycle through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleLogPlugin;

impl LifecycleLogPlugin {
    pub const NAME: &'static str = "lifecycle-log";
}

impl Plugin for LifecycleLogPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, compiler: &mut Compiler) -> anyhow::Result<()> {
        compiler.hooks.run.tap(Self::NAME, |compiler| {
            tracing::info!(entries = compiler.options().entry.len(), "run");
            Ok(())
        });
        compiler.hooks.emit.tap(Self::NAME, |compilation| {
            tracing::info!(assets = compilation.assets().len(), "emit");
            Ok(())
        });
        compiler.hooks.done.tap(Self::NAME, |stats| {
            tracing::info!(files = stats.files.len(), "done");
            Ok(())
        });
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestOptions {
    #[serde(default = "default_manifest_filename")]
    filename: String,
}

fn default_manifest_filename() -> String {
    "manifest.json".to_string()
}

/// Emits a JSON asset mapping chunk names to their bundle files
#[derive(Debug, Clone)]
pub struct ManifestPlugin {
    filename: String,
}

impl ManifestPlugin {
    pub const NAME: &'static str = "manifest";

    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }

    /// `null` options mean defaults
    pub fn from_options(options: &Value) -> anyhow::Result<Self> {
        if options.is_null() {
            return Ok(Self::new(default_manifest_filename()));
        }
        let options: ManifestOptions = serde_json::from_value(options.clone())?;
        Ok(Self::new(options.filename))
    }
}

impl Default for ManifestPlugin {
    fn default() -> Self {
        Self::new(default_manifest_filename())
    }
}

impl Plugin for ManifestPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, compiler: &mut Compiler) -> anyhow::Result<()> {
        let filename = self.filename.clone();
        compiler.hooks.emit.tap(Self::NAME, move |compilation| {
            let manifest = serde_json::to_string_pretty(compilation.chunk_assets())?;
            compilation.emit_asset(filename.clone(), manifest);
            Ok(())
        });
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputPrefixOptions {
    prefix: String,
}

/// Prefixes every chunk's asset path, e.g. `js/` to write `dist/js/main.js`
///
/// Registers on `compilation` and then on that compilation's `assetPath`.
#[derive(Debug, Clone)]
pub struct OutputPrefixPlugin {
    prefix: String,
}

impl OutputPrefixPlugin {
    pub const NAME: &'static str = "output-prefix";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn from_options(options: &Value) -> anyhow::Result<Self> {
        let options: OutputPrefixOptions = serde_json::from_value(options.clone())?;
        Ok(Self::new(options.prefix))
    }
}

impl Plugin for OutputPrefixPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, compiler: &mut Compiler) -> anyhow::Result<()> {
        let prefix = self.prefix.clone();
        compiler
            .hooks
            .compilation
            .tap(Self::NAME, move |compilation, _params| {
                let prefix = prefix.clone();
                compilation
                    .hooks
                    .asset_path
                    .tap(Self::NAME, move |path, _data| Ok(format!("{prefix}{path}")));
                Ok(())
            });
        Ok(())
    }
}
