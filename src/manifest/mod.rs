// Config file parsing (tinypack.toml)

use crate::config::{CompilerOptions, Rule};
use crate::error::ConfigError;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file name looked up by the CLI
pub const DEFAULT_CONFIG_FILE: &str = "tinypack.toml";

/// Parsed tinypack.toml
#[derive(Debug, Deserialize, Default)]
pub struct BundleConfig {
    /// Root for module ids; defaults to the config file's directory
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub entry: Option<EntryConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub resolve: ResolveConfig,
    #[serde(default)]
    pub module: ModuleConfig,
    #[serde(default)]
    pub plugins: Vec<PluginSpec>,
}

/// `entry = "./a.js"` or `[entry] name = "./a.js"`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntryConfig {
    Single(String),
    Named(IndexMap<String, String>),
}

impl EntryConfig {
    /// Entry name -> path; a single path becomes the `main` entry
    pub fn into_map(self) -> IndexMap<String, String> {
        match self {
            EntryConfig::Single(path) => IndexMap::from([("main".to_string(), path)]),
            EntryConfig::Named(map) => map,
        }
    }
}

/// Output section
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Resolve section
#[derive(Debug, Deserialize, Default)]
pub struct ResolveConfig {
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
}

/// Module section
#[derive(Debug, Deserialize, Default)]
pub struct ModuleConfig {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// Individual loader rule
#[derive(Debug, Deserialize, Clone)]
pub struct RuleConfig {
    /// Regular expression tested against the module path
    pub test: String,
    #[serde(rename = "use")]
    pub loaders: UseEntry,
}

/// `use = "loader"` or `use = ["a", "b"]`
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum UseEntry {
    One(String),
    Many(Vec<String>),
}

impl UseEntry {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            UseEntry::One(name) => vec![name],
            UseEntry::Many(names) => names,
        }
    }
}

/// Plugin reference resolved through the plugin registry
#[derive(Debug, Deserialize, Clone)]
pub struct PluginSpec {
    pub name: String,
    #[serde(default)]
    pub options: serde_json::Value,
}

impl BundleConfig {
    /// Parse tinypack.toml from a file path
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse tinypack.toml from a string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: "<string>".into(),
            error: e.to_string(),
        })
    }

    /// Normalize into compiler options
    ///
    /// `base_dir` is the directory relative `context` values are taken from
    /// (usually the config file's directory). Entries and `output.path` are
    /// then taken relative to the context.
    pub fn into_options(self, base_dir: &Path) -> Result<CompilerOptions, ConfigError> {
        let context = match &self.context {
            Some(context) => base_dir.join(expand(context)),
            None => base_dir.to_path_buf(),
        };
        let mut options = CompilerOptions::new(context);

        let entry = self
            .entry
            .ok_or_else(|| ConfigError::Validation("No entry configured".into()))?;
        for (name, path) in entry.into_map() {
            options = options.with_entry(name, expand(&path));
        }

        if let Some(path) = &self.output.path {
            options = options.with_output_path(expand(path));
        }
        if let Some(filename) = self.output.filename {
            options = options.with_filename(filename);
        }
        if let Some(extensions) = self.resolve.extensions {
            options = options.with_extensions(extensions);
        }
        for rule in self.module.rules {
            options = options.with_rule(Rule::new(&rule.test, rule.loaders.into_vec())?);
        }

        options.validate()?;
        Ok(options)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
