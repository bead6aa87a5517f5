// Runtime glue emitted around every chunk

use crate::transform::REQUIRE_FN;

/// Module id -> factory registry
pub const MODULES_VAR: &str = "__tinypack_modules__";

/// Module id -> module record, filled before a factory runs
pub const CACHE_VAR: &str = "__tinypack_module_cache__";

/// Parameters every module factory is declared with
pub(crate) fn factory_params() -> String {
    format!("module, exports, {REQUIRE_FN}")
}

/// The require function
///
/// The module record is cached before its factory runs, so a cyclic require
/// sees the partially populated `module.exports` instead of recursing.
pub(crate) fn require_fn() -> String {
    format!(
        r#"  var {CACHE_VAR} = {{}};
  function {REQUIRE_FN}(id) {{
    if (Object.prototype.hasOwnProperty.call({CACHE_VAR}, id)) {{
      return {CACHE_VAR}[id].exports;
    }}
    if (!Object.prototype.hasOwnProperty.call({MODULES_VAR}, id)) {{
      throw new Error("Cannot find module '" + id + "'");
    }}
    var module = {{ id: id, exports: {{}} }};
    {CACHE_VAR}[id] = module;
    {MODULES_VAR}[id].call(module.exports, module, module.exports, {REQUIRE_FN});
    return module.exports;
  }}
"#
    )
}
