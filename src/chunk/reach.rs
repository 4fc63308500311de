//! Entry and async-boundary reachability over the module graph.
//!
//! Every module reached from an entry through synchronous edges records that
//! entry in `initial`. Targets of deferred edges become async roots; every
//! module reached from an async root through synchronous edges records the
//! root in `async_roots`. Deferred edges inside an async closure start new
//! roots.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::graph::{ModuleGraph, ModuleId};

/// Who loads one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleReach {
    /// Entries loading the module on initial page load.
    pub initial: BTreeSet<String>,
    /// Deferred import targets whose synchronous closure contains the module.
    pub async_roots: BTreeSet<ModuleId>,
}

impl ModuleReach {
    /// Number of distinct loaders (entries plus async roots).
    pub fn owner_count(&self) -> usize {
        self.initial.len() + self.async_roots.len()
    }
}

/// Reachability of every module reachable from at least one entry.
#[derive(Debug, Clone, Default)]
pub struct Reachability {
    reach: FxHashMap<ModuleId, ModuleReach>,
    /// First-visit order (entries by name, then async roots as discovered).
    order: Vec<ModuleId>,
    /// Async roots in discovery order.
    roots: Vec<ModuleId>,
}

impl Reachability {
    /// Compute reachability. Entries must already be validated against the graph.
    pub fn compute(graph: &ModuleGraph, entries: &BTreeMap<String, ModuleId>) -> Self {
        let mut this = Self::default();
        let mut known_roots = FxHashSet::default();

        for (name, entry) in entries {
            this.walk(graph, entry, &mut known_roots, |reach| {
                reach.initial.insert(name.clone())
            });
        }

        // Roots discovered while walking other roots are appended to `roots`.
        let mut next = 0;
        while next < this.roots.len() {
            let root = this.roots[next].clone();
            next += 1;
            this.walk(graph, &root, &mut known_roots, |reach| {
                reach.async_roots.insert(root.clone())
            });
        }

        this
    }

    /// Depth-first walk over synchronous edges from `start`.
    ///
    /// `mark` returns false when the module already carried the mark, which
    /// stops the walk there.
    fn walk(
        &mut self,
        graph: &ModuleGraph,
        start: &ModuleId,
        known_roots: &mut FxHashSet<ModuleId>,
        mut mark: impl FnMut(&mut ModuleReach) -> bool,
    ) {
        let mut stack = vec![start.clone()];
        while let Some(id) = stack.pop() {
            let Some(module) = graph.get(&id) else {
                continue;
            };
            if !self.reach.contains_key(&id) {
                self.order.push(id.clone());
            }
            let reach = self.reach.entry(id.clone()).or_default();
            if !mark(reach) {
                continue;
            }

            for dep in module.dependencies.iter().filter(|d| d.deferred) {
                if known_roots.insert(dep.id.clone()) {
                    self.roots.push(dep.id.clone());
                }
            }
            // Reversed so the first declared dependency is visited first.
            stack.extend(
                module
                    .dependencies
                    .iter()
                    .rev()
                    .filter(|d| !d.deferred)
                    .map(|d| d.id.clone()),
            );
        }
    }

    pub fn get(&self, id: &ModuleId) -> Option<&ModuleReach> {
        self.reach.get(id)
    }

    pub fn is_reachable(&self, id: &ModuleId) -> bool {
        self.reach.contains_key(id)
    }

    /// Reachable modules in first-visit order.
    pub fn order(&self) -> &[ModuleId] {
        &self.order
    }

    /// Async roots in discovery order.
    pub fn roots(&self) -> &[ModuleId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Dependency, Module};

    fn graph() -> ModuleGraph {
        ModuleGraph::new(vec![
            Module::new("main.js", "").with_deps([
                Dependency::sync("utils.js"),
                Dependency::deferred("page.js"),
            ]),
            Module::new("admin.js", "").with_deps([Dependency::sync("utils.js")]),
            Module::new("utils.js", "").with_deps([Dependency::sync("lib.js")]),
            Module::new("lib.js", ""),
            Module::new("page.js", "").with_deps([
                Dependency::sync("lib.js"),
                Dependency::sync("chart.js"),
                Dependency::deferred("modal.js"),
            ]),
            Module::new("chart.js", ""),
            Module::new("modal.js", ""),
            Module::new("orphan.js", ""),
        ])
        .unwrap()
    }

    fn entries() -> BTreeMap<String, ModuleId> {
        BTreeMap::from([
            ("admin".to_string(), ModuleId::new("admin.js")),
            ("main".to_string(), ModuleId::new("main.js")),
        ])
    }

    #[test]
    fn test_initial_sets() {
        let reach = Reachability::compute(&graph(), &entries());
        let utils = reach.get(&"utils.js".into()).unwrap();
        assert_eq!(utils.initial.iter().collect::<Vec<_>>(), ["admin", "main"]);
        let lib = reach.get(&"lib.js".into()).unwrap();
        assert_eq!(lib.initial.len(), 2);
        // Also inside the deferred page's closure.
        assert!(lib.async_roots.contains(&ModuleId::new("page.js")));
    }

    #[test]
    fn test_async_roots_chain() {
        let reach = Reachability::compute(&graph(), &entries());
        assert_eq!(reach.roots(), [ModuleId::new("page.js"), ModuleId::new("modal.js")]);
        let chart = reach.get(&"chart.js".into()).unwrap();
        assert!(chart.initial.is_empty());
        assert_eq!(chart.async_roots.len(), 1);
        let modal = reach.get(&"modal.js".into()).unwrap();
        assert!(modal.async_roots.contains(&ModuleId::new("modal.js")));
    }

    #[test]
    fn test_unreachable_module_absent() {
        let reach = Reachability::compute(&graph(), &entries());
        assert!(!reach.is_reachable(&"orphan.js".into()));
        assert_eq!(reach.len(), 7);
    }

    #[test]
    fn test_first_visit_order() {
        let reach = Reachability::compute(&graph(), &entries());
        let order: Vec<_> = reach.order().iter().map(ModuleId::as_str).collect();
        assert_eq!(
            order,
            ["admin.js", "utils.js", "lib.js", "main.js", "page.js", "chart.js", "modal.js"]
        );
    }

    #[test]
    fn test_cycles_terminate() {
        let graph = ModuleGraph::new(vec![
            Module::new("a.js", "").with_deps([Dependency::sync("b.js")]),
            Module::new("b.js", "").with_deps([Dependency::sync("a.js")]),
        ])
        .unwrap();
        let entries = BTreeMap::from([("a".to_string(), ModuleId::new("a.js"))]);
        let reach = Reachability::compute(&graph, &entries);
        assert_eq!(reach.len(), 2);
    }
}
