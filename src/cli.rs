// CLI commands

use crate::config::ResolveOptions;
use crate::loaders::LoaderRegistry;
use crate::manifest::{BundleConfig, EntryConfig, DEFAULT_CONFIG_FILE};
use crate::plugins::PluginRegistry;
use crate::resolve::{normalize, Resolver};
use anyhow::{Context, Result};
use clap::Subcommand;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Bundler subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bundle every entry into one file per entry
    Build {
        /// Config file (default: ./tinypack.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Entry as NAME=PATH; replaces the configured entries (repeatable)
        #[arg(short, long = "entry", value_parser = parse_entry)]
        entries: Vec<(String, String)>,

        /// Output directory
        #[arg(short, long)]
        output_path: Option<PathBuf>,

        /// Output filename template, e.g. "[name].bundle.js"
        #[arg(short, long)]
        filename: Option<String>,

        /// Print build stats as JSON instead of the emitted files
        #[arg(long)]
        json: bool,
    },

    /// Resolve a require specifier the way the bundler does
    Resolve {
        /// Specifier, e.g. ./lib/util
        specifier: String,

        /// Directory the specifier is relative to (default: current directory)
        #[arg(long)]
        from: Option<PathBuf>,

        /// Candidate extension, tried in order (default: .js)
        #[arg(long = "ext")]
        extensions: Vec<String>,
    },
}

impl Commands {
    /// Execute the command
    pub fn run(self) -> Result<()> {
        match self {
            Commands::Build {
                config,
                entries,
                output_path,
                filename,
                json,
            } => Self::build_cmd(config, entries, output_path, filename, json),
            Commands::Resolve {
                specifier,
                from,
                extensions,
            } => Self::resolve_cmd(specifier, from, extensions),
        }
    }

    fn build_cmd(
        config: Option<PathBuf>,
        entries: Vec<(String, String)>,
        output_path: Option<PathBuf>,
        filename: Option<String>,
        json: bool,
    ) -> Result<()> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let (bundle_config, base_dir) = load_config(&cwd, config, !entries.is_empty())?;

        let overrides = Overrides {
            entries,
            output_path,
            filename,
        };
        let plugin_specs = bundle_config.plugins.clone();
        let options = overrides.apply(bundle_config, &cwd).into_options(&base_dir)?;

        let registry = PluginRegistry::with_builtins();
        let plugins = plugin_specs
            .iter()
            .map(|spec| registry.create(spec))
            .collect::<Result<Vec<_>, _>>()?;

        let output_dir = options.output.path.clone();
        let compiler = crate::create_compiler(options, LoaderRegistry::with_builtins(), &plugins)?;
        let stats = compiler.run()?;

        if json {
            println!("{}", serde_json::to_string_pretty(&stats.to_json())?);
        } else {
            for file in &stats.files {
                println!("{}", output_dir.join(file).display());
            }
        }
        Ok(())
    }

    fn resolve_cmd(
        specifier: String,
        from: Option<PathBuf>,
        extensions: Vec<String>,
    ) -> Result<()> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let base_dir = normalize(cwd.join(from.unwrap_or_default()));
        let extensions = if extensions.is_empty() {
            ResolveOptions::default().extensions
        } else {
            extensions
        };

        let resolver = Resolver::new(&cwd, extensions);
        let resolved = resolver.resolve(&base_dir, &specifier)?;
        println!("{}", resolved.display());
        Ok(())
    }
}

/// Command-line values layered over the config file
#[derive(Debug, Default)]
struct Overrides {
    entries: Vec<(String, String)>,
    output_path: Option<PathBuf>,
    filename: Option<String>,
}

impl Overrides {
    /// Replace config values with the ones given on the command line
    ///
    /// Paths given on the command line are relative to `cwd`, not to the
    /// config's context.
    fn apply(self, mut config: BundleConfig, cwd: &Path) -> BundleConfig {
        if !self.entries.is_empty() {
            let entries: IndexMap<String, String> = self
                .entries
                .into_iter()
                .map(|(name, path)| (name, absolute(cwd, &path)))
                .collect();
            config.entry = Some(EntryConfig::Named(entries));
        }
        if let Some(path) = self.output_path {
            config.output.path = Some(absolute(cwd, &path.to_string_lossy()));
        }
        if let Some(filename) = self.filename {
            config.output.filename = Some(filename);
        }
        config
    }
}

fn absolute(cwd: &Path, path: &str) -> String {
    let expanded = shellexpand::tilde(path);
    normalize(cwd.join(expanded.as_ref()))
        .to_string_lossy()
        .into_owned()
}

/// Load the config file, returning it with the directory it was found in
///
/// A missing default config is fine when entries come from the command line.
fn load_config(
    cwd: &Path,
    explicit: Option<PathBuf>,
    has_cli_entries: bool,
) -> Result<(BundleConfig, PathBuf)> {
    let path = match explicit {
        Some(path) => cwd.join(path),
        None => {
            let path = cwd.join(DEFAULT_CONFIG_FILE);
            if !path.is_file() && has_cli_entries {
                tracing::debug!("no {DEFAULT_CONFIG_FILE}, using command-line options only");
                return Ok((BundleConfig::default(), cwd.to_path_buf()));
            }
            path
        }
    };

    let config = BundleConfig::from_file(&path)?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.to_path_buf());
    tracing::debug!(config = %path.display(), "loaded config");
    Ok((config, base_dir))
}

fn parse_entry(value: &str) -> Result<(String, String), String> {
    let (name, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{value}'"))?;
    if name.is_empty() || path.is_empty() {
        return Err(format!("expected NAME=PATH, got '{value}'"));
    }
    Ok((name.to_string(), path.to_string()))
}
