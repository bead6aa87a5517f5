// Normalized compiler configuration

use crate::error::ConfigError;
use crate::resolve::normalize;
use indexmap::IndexMap;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Placeholder substituted by the chunk name in `output.filename`
pub const NAME_PLACEHOLDER: &str = "[name]";

/// Fully normalized options consumed by the compiler
///
/// All paths are absolute and lexically normalized; the entry map is never a
/// bare string at this point.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Root directory module ids are computed against
    pub context: PathBuf,

    /// Entry name -> absolute entry path, in configuration order
    pub entry: IndexMap<String, PathBuf>,

    pub output: OutputOptions,

    pub resolve: ResolveOptions,

    pub module: ModuleOptions,
}

impl CompilerOptions {
    /// Options rooted at `context` with defaults everywhere else
    pub fn new(context: impl Into<PathBuf>) -> Self {
        let context = normalize(context.into());
        Self {
            output: OutputOptions {
                path: context.join("dist"),
                filename: format!("{NAME_PLACEHOLDER}.js"),
            },
            context,
            entry: IndexMap::new(),
            resolve: ResolveOptions::default(),
            module: ModuleOptions::default(),
        }
    }

    /// Add an entry; relative paths are taken from the context directory
    pub fn with_entry(mut self, name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        let path = self.absolute(path.as_ref());
        self.entry.insert(name.into(), path);
        self
    }

    /// Set the output directory; relative paths are taken from the context directory
    pub fn with_output_path(mut self, path: impl AsRef<Path>) -> Self {
        self.output.path = self.absolute(path.as_ref());
        self
    }

    /// Set the output filename template
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.output.filename = filename.into();
        self
    }

    /// Set the candidate extensions tried after the literal path
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolve.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Append a loader rule
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.module.rules.push(rule);
        self
    }

    /// Resolve `path` against the context directory
    pub fn absolute(&self, path: &Path) -> PathBuf {
        normalize(self.context.join(path))
    }

    /// Validate the normalized options
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entry.is_empty() {
            return Err(ConfigError::Validation("No entry configured".into()));
        }
        if let Some(name) = self.entry.keys().find(|name| name.is_empty()) {
            return Err(ConfigError::Validation(format!(
                "Entry name cannot be empty (got {name:?})"
            )));
        }
        if self.output.filename.is_empty() {
            return Err(ConfigError::Validation(
                "output.filename cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Output destination and naming
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Directory assets are written to
    pub path: PathBuf,

    /// Filename template, e.g. `[name].js`
    pub filename: String,
}

impl OutputOptions {
    /// Substitute every `[name]` in the template with the chunk name
    pub fn filename_for(&self, chunk_name: &str) -> String {
        self.filename.replace(NAME_PLACEHOLDER, chunk_name)
    }
}

/// Module resolution options
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Candidate extensions tried, in order, after the literal path
    pub extensions: Vec<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            extensions: vec![".js".to_string()],
        }
    }
}

/// Module processing options
#[derive(Debug, Clone, Default)]
pub struct ModuleOptions {
    pub rules: Vec<Rule>,
}

/// A loader rule: modules whose path matches `test` go through `loaders`
#[derive(Debug, Clone)]
pub struct Rule {
    pub test: Regex,
    pub loaders: Vec<String>,
}

impl Rule {
    /// Compile a rule from a regular expression and loader identifiers
    pub fn new<I, S>(pattern: &str, loaders: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let test = Regex::new(pattern).map_err(|e| ConfigError::InvalidRule {
            pattern: pattern.to_string(),
            error: e.to_string(),
        })?;
        Ok(Self {
            test,
            loaders: loaders.into_iter().map(Into::into).collect(),
        })
    }

    /// Whether this rule applies to a module path (forward-slash form)
    pub fn matches(&self, resource: &str) -> bool {
        self.test.is_match(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = CompilerOptions::new("/app");
        assert_eq!(options.output.path, PathBuf::from("/app/dist"));
        assert_eq!(options.output.filename, "[name].js");
        assert_eq!(options.resolve.extensions, vec![".js"]);
        assert!(options.module.rules.is_empty());
        assert!(options.entry.is_empty());
    }

    #[test]
    fn entries_resolve_against_context() {
        let options = CompilerOptions::new("/app")
            .with_entry("main", "./src/index.js")
            .with_entry("abs", "/elsewhere/x.js");
        assert_eq!(options.entry["main"], PathBuf::from("/app/src/index.js"));
        assert_eq!(options.entry["abs"], PathBuf::from("/elsewhere/x.js"));
        let names: Vec<_> = options.entry.keys().collect();
        assert_eq!(names, vec!["main", "abs"]);
    }

    #[test]
    fn filename_substitutes_every_placeholder() {
        let output = OutputOptions {
            path: PathBuf::from("/out"),
            filename: "[name]/[name].bundle.js".to_string(),
        };
        assert_eq!(output.filename_for("main"), "main/main.bundle.js");
    }

    #[test]
    fn validate_requires_entry() {
        let options = CompilerOptions::new("/app");
        assert!(matches!(options.validate(), Err(ConfigError::Validation(_))));

        let options = options.with_entry("main", "a.js");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_filename() {
        let options = CompilerOptions::new("/app")
            .with_entry("main", "a.js")
            .with_filename("");
        assert!(options.validate().is_err());
    }

    #[test]
    fn rule_matches_path() {
        let rule = Rule::new(r"\.js$", ["a"]).unwrap();
        assert!(rule.matches("/app/src/a.js"));
        assert!(!rule.matches("/app/src/a.json"));
    }

    #[test]
    fn rule_rejects_bad_regex() {
        let err = Rule::new("(", ["a"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { pattern, .. } if pattern == "("));
    }
}
