// Built-in loaders

use super::{Loader, LoaderContext};

/// Strips the UTF-8 byte order mark from the start of a module
///
/// The BOM is U+FEFF (0xEF 0xBB 0xBF in UTF-8) and is sometimes present at the
/// start of files.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripBomLoader;

impl StripBomLoader {
    pub const NAME: &'static str = "strip-bom";
}

impl Loader for StripBomLoader {
    fn transform(&self, source: &str, _context: &LoaderContext) -> anyhow::Result<String> {
        Ok(source.strip_prefix('\u{FEFF}').unwrap_or(source).to_string())
    }
}

/// Turns a JSON document into a CommonJS module exporting the parsed value
///
/// The document is validated first so that a malformed file fails the build
/// at its own path instead of at runtime.
///
/// ```ignore
/// // Input:  {"key": "value"}
/// // Output: module.exports = JSON.parse("{\"key\": \"value\"}");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

impl JsonLoader {
    pub const NAME: &'static str = "json";
}

impl Loader for JsonLoader {
    fn transform(&self, source: &str, context: &LoaderContext) -> anyhow::Result<String> {
        let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);
        serde_json::from_str::<serde_json::Value>(source).map_err(|e| {
            anyhow::anyhow!("invalid JSON in {}: {}", context.resource(), e)
        })?;

        // A JSON string literal is also a valid JS string literal.
        let escaped = serde_json::to_string(source)?;
        Ok(format!("module.exports = JSON.parse({escaped});\n"))
    }
}
