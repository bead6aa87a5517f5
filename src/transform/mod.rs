// require() rewriting using OXC

use crate::error::{BundleError, Location};
use crate::resolve::Resolver;
use indexmap::IndexMap;
use oxc_allocator::Allocator;
use oxc_ast::ast::{Argument, CallExpression, Expression};
use oxc_ast_visit::{walk_mut, VisitMut};
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::path::{Path, PathBuf};

/// Name of the runtime require function inside generated bundles
pub const REQUIRE_FN: &str = "__tinypack_require__";

/// Output of rewriting one module
#[derive(Debug)]
pub struct RewriteOutput {
    /// Regenerated source with every require call pointing at a module id
    pub code: String,

    /// Dependency id -> absolute path, in source order of the require calls
    pub dependencies: IndexMap<String, PathBuf>,
}

/// Parse `source`, rewrite its `require("...")` calls and regenerate code
///
/// Each specifier is resolved relative to the directory of `path`. The callee
/// is renamed to [`REQUIRE_FN`] and the first argument replaced by the
/// dependency's canonical id.
pub fn rewrite_requires(
    source: &str,
    path: &Path,
    module_id: &str,
    resolver: &Resolver,
) -> Result<RewriteOutput, BundleError> {
    // Unknown or missing extensions parse like `.js`: a sloppy script unless
    // the source uses import/export.
    let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::unambiguous());
    let allocator = Allocator::default();

    let parse_result = Parser::new(&allocator, source, source_type).parse();
    if !parse_result.errors.is_empty() {
        let offset = parse_result.errors[0]
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| label.offset())
            .unwrap_or(0);
        let errors: Vec<String> = parse_result.errors.iter().map(|e| e.to_string()).collect();
        return Err(BundleError::Parse {
            module: module_id.to_string(),
            location: Location::from_offset(source, offset),
            message: errors.join("\n"),
        });
    }
    let mut program = parse_result.program;

    let base_dir = path.parent().unwrap_or(resolver.root());
    let mut rewriter = RequireRewriter {
        allocator: &allocator,
        source,
        module_id,
        base_dir,
        resolver,
        dependencies: IndexMap::new(),
        error: None,
    };
    rewriter.visit_program(&mut program);

    if let Some(err) = rewriter.error {
        return Err(err);
    }
    let dependencies = rewriter.dependencies;

    let code = Codegen::new().build(&program).code;
    Ok(RewriteOutput { code, dependencies })
}

struct RequireRewriter<'a, 'r> {
    allocator: &'a Allocator,
    source: &'r str,
    module_id: &'r str,
    base_dir: &'r Path,
    resolver: &'r Resolver,
    dependencies: IndexMap<String, PathBuf>,
    /// First failure; the rest of the traversal is skipped once set
    error: Option<BundleError>,
}

impl<'a> RequireRewriter<'a, '_> {
    fn rewrite(&mut self, call: &mut CallExpression<'a>) -> Result<(), BundleError> {
        let Expression::Identifier(callee) = &mut call.callee else {
            return Ok(());
        };
        if callee.name.as_str() != "require" {
            return Ok(());
        }

        let location = Location::from_offset(self.source, call.span.start as usize);
        let Some(Argument::StringLiteral(specifier)) = call.arguments.first_mut() else {
            return Err(BundleError::DynamicRequire {
                module: self.module_id.to_string(),
                location,
            });
        };

        let absolute = self
            .resolver
            .resolve(self.base_dir, specifier.value.as_str())?;
        let id = self.resolver.module_id(&absolute);
        tracing::debug!(
            module = %self.module_id,
            request = %specifier.value,
            dependency = %id,
            "resolved require"
        );

        callee.name = REQUIRE_FN.into();
        specifier.value = self.allocator.alloc_str(&id).into();
        specifier.raw = None;
        self.dependencies.entry(id).or_insert(absolute);
        Ok(())
    }
}

impl<'a> VisitMut<'a> for RequireRewriter<'a, '_> {
    fn visit_call_expression(&mut self, call: &mut CallExpression<'a>) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.rewrite(call) {
            self.error = Some(err);
            return;
        }
        walk_mut::walk_call_expression(self, call);
    }
}
