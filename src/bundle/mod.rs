// Bundle code generation - one self-executing program per chunk

pub mod runtime;

pub use runtime::{CACHE_VAR, MODULES_VAR};

use crate::chunk::Chunk;
use crate::transform::REQUIRE_FN;
use std::fmt::Write;

/// Render a chunk into a self-contained bundle
///
/// The output is a single IIFE holding the module registry, the module cache
/// and the require function, ending with a require of the entry module. The
/// value of the whole program is the entry module's exports.
pub fn render(chunk: &Chunk) -> String {
    let mut out = String::new();
    out.push_str("(function () {\n");
    let _ = writeln!(out, "  var {MODULES_VAR} = {{");

    let params = runtime::factory_params();
    for module in &chunk.modules {
        let _ = writeln!(
            out,
            "    {}: function ({params}) {{",
            js_string(module.id())
        );
        out.push_str(module.transformed_source());
        if !module.transformed_source().ends_with('\n') {
            out.push('\n');
        }
        out.push_str("    },\n");
    }
    out.push_str("  };\n");

    out.push_str(&runtime::require_fn());
    let _ = writeln!(out, "  return {REQUIRE_FN}({});", js_string(chunk.entry_id()));
    out.push_str("})();\n");
    out
}

/// JSON string literals are valid JS string literals
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
