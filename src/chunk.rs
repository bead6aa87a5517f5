// Chunk assembly - one chunk per entry

use crate::graph::Module;
use serde::Serialize;

/// The modules reachable from one entry, rendered into one bundle
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    /// Entry name this chunk represents
    pub name: String,

    pub entry_module: Module,

    /// Every module owned by `name`, in module-set insertion order
    pub modules: Vec<Module>,
}

impl Chunk {
    pub fn entry_id(&self) -> &str {
        self.entry_module.id()
    }

    pub fn module_ids(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(Module::id)
    }
}

/// Select every module whose owners include `name`
///
/// This is a pure filter: order is the iteration order of `all_modules`, not
/// dependency order, and modules shared by several entries are copied into
/// each chunk that needs them.
pub fn assemble_chunk<'m>(
    name: &str,
    entry_module: &Module,
    all_modules: impl IntoIterator<Item = &'m Module>,
) -> Chunk {
    let modules: Vec<Module> = all_modules
        .into_iter()
        .filter(|module| module.is_owned_by(name))
        .cloned()
        .collect();
    tracing::debug!(chunk = name, modules = modules.len(), "assembled chunk");

    Chunk {
        name: name.to_string(),
        entry_module: entry_module.clone(),
        modules,
    }
}
