// Loader pipeline - rule-matched, synchronous source transforms

pub mod builtin;
pub mod context;

pub use builtin::{JsonLoader, StripBomLoader};
pub use context::LoaderContext;

use crate::config::Rule;
use crate::error::BundleError;
use std::collections::BTreeMap;

/// A synchronous text-to-text source transform
///
/// Loaders run before a module is parsed. They receive the current source
/// text and return the next one; an `Err` aborts the whole build.
pub trait Loader {
    fn transform(&self, source: &str, context: &LoaderContext) -> anyhow::Result<String>;
}

impl<F> Loader for F
where
    F: Fn(&str, &LoaderContext) -> anyhow::Result<String>,
{
    fn transform(&self, source: &str, context: &LoaderContext) -> anyhow::Result<String> {
        self(source, context)
    }
}

/// Maps the loader identifiers used in rules to loader implementations
///
/// Identifiers are resolved once, when the compiler is constructed; nothing
/// is looked up by name reflectively during a build.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: BTreeMap<String, Box<dyn Loader>>,
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("loaders", &self.loaders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LoaderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in loaders (`strip-bom`, `json`)
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(StripBomLoader::NAME, StripBomLoader);
        registry.register(JsonLoader::NAME, JsonLoader);
        registry
    }

    /// Register a loader under `name`, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, loader: impl Loader + 'static) {
        self.loaders.insert(name.into(), Box::new(loader));
    }

    /// Register a closure as a loader
    pub fn register_fn<F>(&mut self, name: impl Into<String>, loader: F)
    where
        F: Fn(&str, &LoaderContext) -> anyhow::Result<String> + 'static,
    {
        self.loaders.insert(name.into(), Box::new(loader));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Loader> {
        self.loaders.get(name).map(|l| l.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loaders.contains_key(name)
    }

    /// Registered identifiers, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Check that every identifier named by `rules` is registered
    pub fn validate(&self, rules: &[Rule]) -> Result<(), BundleError> {
        for rule in rules {
            for name in &rule.loaders {
                if !self.contains(name) {
                    return Err(BundleError::UnknownLoader { name: name.clone() });
                }
            }
        }
        Ok(())
    }
}

/// Collect the loaders of every rule matching `resource`
///
/// Rule order is preserved, then order within a rule.
pub fn matching_loaders<'r>(rules: &'r [Rule], resource: &str) -> Vec<&'r str> {
    rules
        .iter()
        .filter(|rule| rule.matches(resource))
        .flat_map(|rule| rule.loaders.iter().map(String::as_str))
        .collect()
}

/// Run the loader pipeline over one module's source
///
/// Loaders from all matching rules are gathered first, then executed once
/// each in reverse order, so `[a, b]` yields `a(b(source))`.
pub fn apply_loaders(
    rules: &[Rule],
    registry: &LoaderRegistry,
    context: &LoaderContext,
    source: String,
) -> Result<String, BundleError> {
    let resource = context.resource();
    let chain = matching_loaders(rules, &resource);
    if chain.is_empty() {
        return Ok(source);
    }

    let mut code = source;
    for name in chain.iter().rev() {
        let loader = registry
            .get(name)
            .ok_or_else(|| BundleError::UnknownLoader {
                name: name.to_string(),
            })?;

        tracing::trace!(loader = %name, resource = %resource, "running loader");
        code = loader
            .transform(&code, context)
            .map_err(|e| BundleError::Transform {
                loader: name.to_string(),
                module: resource.clone(),
                message: format!("{e:#}"),
            })?;
    }

    Ok(code)
}
