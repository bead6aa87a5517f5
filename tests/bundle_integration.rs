// Integration tests for whole builds
//
// These tests verify end-to-end functionality of:
// - Module identity and owner accumulation across entries
// - Resolution precedence and unresolvable requires
// - Loader ordering
// - Runtime semantics of generated bundles, executed in QuickJS
// - Hook lifecycle and config-file driven builds

use rquickjs::{context::EvalOptions, Context, Runtime};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;
use tinypack::manifest::BundleConfig;
use tinypack::{
    create_compiler, BundleError, Compiler, CompilerOptions, LoaderRegistry, PluginRegistry, Rule,
};

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    for (name, content) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn build(options: CompilerOptions) -> tinypack::Stats {
    Compiler::new(options, LoaderRegistry::with_builtins())
        .expect("compiler")
        .run()
        .expect("build should succeed")
}

/// Execute a bundle and return its value (the entry's exports) as JSON
fn execute(bundle: &str) -> Value {
    let runtime = Runtime::new().expect("quickjs runtime");
    let context = Context::full(&runtime).expect("quickjs context");
    context.with(|ctx| {
        let json: String = ctx
            .eval_with_options(
                format!("var __result = {bundle}\nJSON.stringify(__result);"),
                {
                    let mut options = EvalOptions::default();
                    options.strict = false;
                    options
                },
            )
            .expect("bundle should execute");
        serde_json::from_str(&json).expect("entry exports should be JSON")
    })
}

fn read_output(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join("dist").join(file)).expect("bundle written")
}

/// Every specifier resolving to the same file maps to one module
#[test]
fn identity_is_unique_per_path() {
    let dir = project(&[
        ("src/index.js", "var a = require('./lib/util'); var b = require('./lib/util.js'); require('./lib/other'); module.exports = a === b;"),
        ("src/lib/util.js", "exports.value = 1;"),
        ("src/lib/other.js", "module.exports = require('../lib/util');"),
    ]);
    let stats = build(CompilerOptions::new(dir.path()).with_entry("main", "src/index.js"));

    let mut ids: Vec<_> = stats.modules.iter().map(|m| m.id().to_string()).collect();
    assert_eq!(ids, vec!["./src/index.js", "./src/lib/util.js", "./src/lib/other.js"]);
    ids.dedup();
    assert_eq!(ids.len(), 3);

    let util = &stats.modules[1];
    let bundle = read_output(dir.path(), "main.js");
    assert_eq!(bundle.matches("\"./src/lib/util.js\": function").count(), 1);
    assert_eq!(util.path(), dir.path().join("src/lib/util.js"));
    assert_eq!(execute(&bundle), json!(true));
}

/// A file shared by two entries is built once and owned by both
#[test]
fn shared_module_owned_by_both_entries_and_loaded_once() {
    let dir = project(&[
        ("one.js", "module.exports = require('./shared').tag + '-one';"),
        ("two.js", "module.exports = require('./shared').tag + '-two';"),
        ("shared.js", "exports.tag = 'shared';"),
    ]);
    let loads = Rc::new(Cell::new(0usize));
    let mut loaders = LoaderRegistry::new();
    let counter = Rc::clone(&loads);
    loaders.register_fn("count-shared", move |source, ctx| {
        if ctx.resource().ends_with("/shared.js") {
            counter.set(counter.get() + 1);
        }
        Ok(source.to_string())
    });

    let options = CompilerOptions::new(dir.path())
        .with_entry("one", "one.js")
        .with_entry("two", "two.js")
        .with_rule(Rule::new(r"\.js$", ["count-shared"]).unwrap());
    let stats = Compiler::new(options, loaders).unwrap().run().unwrap();

    assert_eq!(loads.get(), 1);
    let shared = stats.modules.iter().find(|m| m.id() == "./shared.js").unwrap();
    let owners: Vec<_> = shared.owning_entries().iter().cloned().collect();
    assert_eq!(owners, vec!["one", "two"]);

    assert_eq!(execute(&stats.assets["one.js"]), json!("shared-one"));
    assert_eq!(execute(&stats.assets["two.js"]), json!("shared-two"));
}

/// A chunk holds exactly the modules owned by its entry
#[test]
fn chunk_inclusion_matches_owners() {
    let dir = project(&[
        ("a.js", "require('./common'); require('./only-a');"),
        ("b.js", "require('./common');"),
        ("common.js", "require('./deep');"),
        ("deep.js", ""),
        ("only-a.js", ""),
    ]);
    let stats = build(
        CompilerOptions::new(dir.path())
            .with_entry("a", "a.js")
            .with_entry("b", "b.js"),
    );

    for chunk in &stats.chunks {
        for module in &stats.modules {
            let included = chunk.module_ids().any(|id| id == module.id());
            assert_eq!(
                included,
                module.is_owned_by(&chunk.name),
                "{} in chunk {}",
                module.id(),
                chunk.name
            );
        }
    }
    let b: Vec<_> = stats.chunks[1].module_ids().collect();
    assert_eq!(b, vec!["./common.js", "./deep.js", "./b.js"]);
}

/// An existing literal path wins over extension probing
#[test]
fn literal_path_wins_over_extensions() {
    let dir = project(&[
        ("index.js", "module.exports = require('./foo');"),
        ("foo", "module.exports = 'literal';"),
        ("foo.js", "module.exports = 'with-extension';"),
    ]);
    let stats = build(
        CompilerOptions::new(dir.path())
            .with_entry("main", "index.js")
            .with_extensions([".js", ".ts"]),
    );

    assert!(stats.modules.iter().any(|m| m.id() == "./foo"));
    assert!(!stats.modules.iter().any(|m| m.id() == "./foo.js"));
    assert_eq!(execute(&stats.assets["main.js"]), json!("literal"));
}

/// An extensionless module accepts the same sloppy-mode syntax as a `.js` file
#[test]
fn extensionless_module_parses_like_js() {
    let dir = project(&[
        ("index.js", "module.exports = [require('./legacy'), require('./legacy.js')];"),
        ("legacy", "with (Math) { module.exports = 010 + max(1, 2); }"),
        ("legacy.js", "with (Math) { module.exports = 010 + min(1, 2); }"),
    ]);
    let stats = build(CompilerOptions::new(dir.path()).with_entry("main", "index.js"));

    assert!(stats.modules.iter().any(|m| m.id() == "./legacy"));
    assert_eq!(execute(&stats.assets["main.js"]), json!([10, 9]));
}

/// Asset paths that collide or leave the output directory fail before writing
#[test]
fn bad_asset_paths_write_nothing() {
    let dir = project(&[("a.js", ""), ("b.js", "")]);
    let options = CompilerOptions::new(dir.path())
        .with_entry("a", "a.js")
        .with_entry("b", "b.js")
        .with_filename("bundle.js");
    let err = Compiler::new(options, LoaderRegistry::new())
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, BundleError::InvalidAsset { ref name, .. } if name == "bundle.js"));
    assert!(!dir.path().join("dist").exists());

    let options = CompilerOptions::new(dir.path()).with_entry("a", "a.js");
    let mut compiler = Compiler::new(options, LoaderRegistry::new()).unwrap();
    compiler.hooks.compilation.tap("escape", |compilation, _params| {
        compilation
            .hooks
            .asset_path
            .tap("escape", |path, _data| Ok(format!("../{path}")));
        Ok(())
    });
    let err = compiler.run().unwrap_err();
    assert!(matches!(err, BundleError::InvalidAsset { ref name, .. } if name == "../a.js"));
    assert!(!dir.path().join("dist").exists());
}

/// An unresolvable require fails the build and writes nothing
#[test]
fn unresolvable_require_writes_nothing() {
    let dir = project(&[
        ("src/index.js", "require('./ok'); require('./missing');"),
        ("src/ok.js", ""),
    ]);
    let options = CompilerOptions::new(dir.path()).with_entry("main", "src/index.js");
    let err = Compiler::new(options, LoaderRegistry::new())
        .unwrap()
        .run()
        .unwrap_err();

    match &err {
        BundleError::ModuleNotFound {
            specifier,
            base_dir,
        } => {
            assert_eq!(specifier, "./missing");
            assert_eq!(base_dir, &dir.path().join("src"));
        }
        other => panic!("Expected ModuleNotFound, got {other:?}"),
    }
    assert!(err.to_string().contains("Can't resolve './missing'"));
    assert!(!dir.path().join("dist").exists());
}

/// Loaders [A, B] run B first, then A on B's output
#[test]
fn loaders_apply_right_to_left() {
    let dir = project(&[("index.js", "exports.trail = ['raw'];")]);
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut loaders = LoaderRegistry::new();
    for name in ["A", "B"] {
        let calls = Rc::clone(&calls);
        loaders.register_fn(name, move |source, _ctx| {
            calls.borrow_mut().push(name);
            Ok(format!("{source}\nexports.trail.push('{name}');"))
        });
    }

    let options = CompilerOptions::new(dir.path())
        .with_entry("main", "index.js")
        .with_rule(Rule::new(r"index\.js$", ["A", "B"]).unwrap());
    let stats = Compiler::new(options, loaders).unwrap().run().unwrap();

    assert_eq!(*calls.borrow(), vec!["B", "A"]);
    assert_eq!(execute(&stats.assets["main.js"]), json!({ "trail": ["raw", "B", "A"] }));
}

/// The require function caches exports and hands out the same object
#[test]
fn runtime_caches_module_exports() {
    let dir = project(&[
        (
            "main.js",
            "var util = require('./util');\nvar other = require('./other');\nmodule.exports = { same: util === other.util, runs: util.runs, value: util.value };",
        ),
        ("other.js", "exports.util = require('./util');"),
        ("util.js", "globalThis.__runs = (globalThis.__runs || 0) + 1;\nexports.runs = globalThis.__runs;\nexports.value = 42;"),
    ]);
    let stats = build(CompilerOptions::new(dir.path()).with_entry("main", "main.js"));

    let result = execute(&read_output(dir.path(), "main.js"));
    assert_eq!(result, json!({ "same": true, "runs": 1, "value": 42 }));
    assert_eq!(stats.files, vec!["main.js"]);
}

/// `this` in a module is its exports object, as in Node
#[test]
fn factories_run_with_exports_as_this() {
    let dir = project(&[("main.js", "this.viaThis = true;\nexports.same = this === module.exports;")]);
    let stats = build(CompilerOptions::new(dir.path()).with_entry("main", "main.js"));
    assert_eq!(
        execute(&stats.assets["main.js"]),
        json!({ "viaThis": true, "same": true })
    );
}

/// A cycle terminates; the inner module sees partial exports
#[test]
fn cycles_expose_partial_exports() {
    let dir = project(&[
        (
            "a.js",
            "exports.name = 'a';\nvar b = require('./b');\nexports.bSawA = b.sawA;\nexports.bDone = b.done;",
        ),
        (
            "b.js",
            "var a = require('./a');\nexports.sawA = JSON.stringify(a);\nexports.done = true;",
        ),
    ]);
    let stats = build(CompilerOptions::new(dir.path()).with_entry("main", "a.js"));

    assert_eq!(stats.modules.len(), 2);
    assert_eq!(
        execute(&stats.assets["main.js"]),
        json!({ "name": "a", "bSawA": "{\"name\":\"a\"}", "bDone": true })
    );
}

/// JSON files go through the built-in json loader
#[test]
fn json_modules_via_builtin_loader() {
    let dir = project(&[
        ("main.js", "var data = require('./data.json');\nmodule.exports = data.items.length;"),
        ("data.json", "\u{FEFF}{ \"items\": [1, 2, 3] }"),
    ]);
    let stats = build(
        CompilerOptions::new(dir.path())
            .with_entry("main", "main.js")
            .with_rule(Rule::new(r"\.json$", ["json", "strip-bom"]).unwrap()),
    );
    assert_eq!(execute(&stats.assets["main.js"]), json!(3));
}

/// Filename template, nested output and the done hook
#[test]
fn hooks_observe_the_whole_build() {
    let dir = project(&[("src/app.js", "module.exports = 'app';")]);
    let options = CompilerOptions::new(dir.path())
        .with_entry("app", "src/app.js")
        .with_output_path("build")
        .with_filename("[name]/[name].bundle.js");
    let mut compiler = Compiler::new(options, LoaderRegistry::new()).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    compiler.hooks.emit.tap("banner", move |compilation| {
        let names: Vec<String> = compilation.assets().keys().cloned().collect();
        log.borrow_mut().push(format!("emit {}", names.join(",")));
        compilation.emit_asset("BANNER.txt", "built by tinypack\n");
        Ok(())
    });
    let log = Rc::clone(&seen);
    compiler.hooks.done.tap("report", move |stats| {
        log.borrow_mut().push(format!("done {}", stats.files.join(",")));
        Ok(())
    });

    compiler.run().unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            "emit app/app.bundle.js",
            "done app/app.bundle.js,BANNER.txt"
        ]
    );
    let bundle = fs::read_to_string(dir.path().join("build/app/app.bundle.js")).unwrap();
    assert_eq!(execute(&bundle), json!("app"));
    assert!(dir.path().join("build/BANNER.txt").is_file());
}

/// A config file with plugins, normalized and built end to end
#[test]
fn config_file_build_with_plugins() {
    let dir = project(&[
        (
            "tinypack.toml",
            r#"
[entry]
main = "./src/main.js"
admin = "./src/admin.js"

[output]
path = "./public"

[resolve]
extensions = [".js", ".json"]

[[module.rules]]
test = '\.json$'
use = "json"

[[plugins]]
name = "output-prefix"
options = { prefix = "js/" }

[[plugins]]
name = "manifest"
"#,
        ),
        ("src/main.js", "module.exports = require('./config').title;"),
        ("src/admin.js", "module.exports = 'admin:' + require('./config').title;"),
        ("src/config.json", r#"{ "title": "tinypack" }"#),
    ]);

    let config = BundleConfig::from_file(&dir.path().join("tinypack.toml")).unwrap();
    let registry = PluginRegistry::with_builtins();
    let plugins: Vec<_> = config
        .plugins
        .iter()
        .map(|spec| registry.create(spec).unwrap())
        .collect();
    let options = config.into_options(dir.path()).unwrap();

    let compiler = create_compiler(options, LoaderRegistry::with_builtins(), &plugins).unwrap();
    let stats = compiler.run().unwrap();

    assert_eq!(stats.files, vec!["js/main.js", "js/admin.js", "manifest.json"]);
    let manifest: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("public/manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest, json!({ "main": "js/main.js", "admin": "js/admin.js" }));

    let main = fs::read_to_string(dir.path().join("public/js/main.js")).unwrap();
    let admin = fs::read_to_string(dir.path().join("public/js/admin.js")).unwrap();
    assert_eq!(execute(&main), json!("tinypack"));
    assert_eq!(execute(&admin), json!("admin:tinypack"));
}

/// A syntax error stops the build with a location
#[test]
fn parse_errors_are_fatal() {
    let dir = project(&[
        ("main.js", "require('./broken');"),
        ("broken.js", "var ok = 1;\nvar = ;\n"),
    ]);
    let options = CompilerOptions::new(dir.path()).with_entry("main", "main.js");
    let err = Compiler::new(options, LoaderRegistry::new())
        .unwrap()
        .run()
        .unwrap_err();

    match err {
        BundleError::Parse {
            module, location, ..
        } => {
            assert_eq!(module, "./broken.js");
            assert_eq!(location.line, 2);
        }
        other => panic!("Expected Parse error, got {other:?}"),
    }
    assert!(!dir.path().join("dist").exists());
}
