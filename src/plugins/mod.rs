// Plugins - code that taps the compiler's hooks at setup time

pub mod builtin;

pub use builtin::{LifecycleLogPlugin, ManifestPlugin, OutputPrefixPlugin};

use crate::compiler::Compiler;
use crate::error::{BundleError, ConfigError};
use crate::manifest::PluginSpec;
use serde_json::Value;
use std::collections::BTreeMap;

/// Registers taps on a [`Compiler`]'s hooks
///
/// `apply` runs once, when the compiler is set up; it should only register
/// taps and never start a build.
pub trait Plugin {
    fn name(&self) -> &str;

    fn apply(&self, compiler: &mut Compiler) -> anyhow::Result<()>;
}

type PluginFactory = Box<dyn Fn(&Value) -> anyhow::Result<Box<dyn Plugin>>>;

/// Maps the plugin names used in config files to factories
#[derive(Default)]
pub struct PluginRegistry {
    factories: BTreeMap<String, PluginFactory>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `lifecycle-log`, `manifest` and `output-prefix`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(LifecycleLogPlugin::NAME, |_options| {
            Ok(Box::new(LifecycleLogPlugin))
        });
        registry.register(ManifestPlugin::NAME, |options| {
            Ok(Box::new(ManifestPlugin::from_options(options)?))
        });
        registry.register(OutputPrefixPlugin::NAME, |options| {
            Ok(Box::new(OutputPrefixPlugin::from_options(options)?))
        });
        registry
    }

    /// Register a factory under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Value) -> anyhow::Result<Box<dyn Plugin>> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate the plugin a config entry refers to
    pub fn create(&self, spec: &PluginSpec) -> Result<Box<dyn Plugin>, BundleError> {
        let factory = self
            .factories
            .get(&spec.name)
            .ok_or_else(|| ConfigError::UnknownPlugin(spec.name.clone()))?;
        factory(&spec.options).map_err(|e| BundleError::Plugin {
            name: spec.name.clone(),
            message: format!("{e:#}"),
        })
    }
}
