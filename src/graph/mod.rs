//! Module graph supplied by an external resolver.
//!
//! The core never resolves imports itself. A [`GraphSupplier`] hands over a
//! complete [`ModuleGraph`]; the graph is validated once (unique ids, known
//! dependency targets) and then treated as immutable for the whole build.

mod manifest;
mod module;

pub use manifest::ManifestSupplier;
pub use module::{Dependency, Module, ModuleId, ModuleKind};

use std::path::PathBuf;

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors raised while receiving or validating the module graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("module `{0}` supplied more than once")]
    DuplicateModule(ModuleId),

    #[error("module `{from}` depends on unknown module `{to}`")]
    UnknownDependency { from: ModuleId, to: ModuleId },

    #[error("entry `{entry}` points at unknown module `{module}`")]
    UnknownEntry { entry: String, module: ModuleId },

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid module manifest `{0}`")]
    Manifest(PathBuf, #[source] serde_json::Error),
}

/// Source of the module graph (import resolution lives outside the core).
pub trait GraphSupplier {
    fn supply(&self) -> Result<ModuleGraph, GraphError>;
}

/// Validated, immutable set of modules with their dependency edges.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    index: FxHashMap<ModuleId, usize>,
}

impl ModuleGraph {
    /// Build a graph, rejecting duplicate ids and dangling edges.
    pub fn new(modules: Vec<Module>) -> Result<Self, GraphError> {
        let mut index = FxHashMap::default();
        for (i, module) in modules.iter().enumerate() {
            if index.insert(module.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateModule(module.id.clone()));
            }
        }

        for module in &modules {
            if let Some(dep) = module
                .dependencies
                .iter()
                .find(|dep| !index.contains_key(&dep.id))
            {
                return Err(GraphError::UnknownDependency {
                    from: module.id.clone(),
                    to: dep.id.clone(),
                });
            }
        }

        Ok(Self { modules, index })
    }

    pub fn get(&self, id: &ModuleId) -> Option<&Module> {
        self.index.get(id).map(|&i| &self.modules[i])
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.index.contains_key(id)
    }

    /// Modules in supply order.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Check that every entry points at a supplied module.
    pub fn validate_entries<'a>(
        &self,
        entries: impl IntoIterator<Item = (&'a String, &'a ModuleId)>,
    ) -> Result<(), GraphError> {
        for (name, id) in entries {
            if !self.contains(id) {
                return Err(GraphError::UnknownEntry {
                    entry: name.clone(),
                    module: id.clone(),
                });
            }
        }
        Ok(())
    }
}

impl GraphSupplier for ModuleGraph {
    fn supply(&self) -> Result<ModuleGraph, GraphError> {
        ModuleGraph::new(self.modules.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_duplicate_module_rejected() {
        let result = ModuleGraph::new(vec![Module::new("a.js", "1"), Module::new("./a.js", "2")]);
        assert!(matches!(result, Err(GraphError::DuplicateModule(id)) if id.as_str() == "a.js"));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let result = ModuleGraph::new(vec![
            Module::new("a.js", "").with_deps([Dependency::sync("missing.js")]),
        ]);
        assert!(matches!(result, Err(GraphError::UnknownDependency { .. })));
    }

    #[test]
    fn test_lookup_and_entries() {
        let graph = ModuleGraph::new(vec![
            Module::new("a.js", "").with_deps([Dependency::sync("b.js")]),
            Module::new("b.js", ""),
        ])
        .unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.get(&ModuleId::new("./b.js")).is_some());

        let mut entries = BTreeMap::new();
        entries.insert("main".to_string(), ModuleId::new("a.js"));
        assert!(graph.validate_entries(&entries).is_ok());

        entries.insert("admin".to_string(), ModuleId::new("admin.js"));
        assert!(matches!(
            graph.validate_entries(&entries),
            Err(GraphError::UnknownEntry { entry, .. }) if entry == "admin"
        ));
    }
}
