//! Cache-group driven chunk partitioning.
//!
//! Planning is one sequential pass over the reachable modules in first-visit
//! order. For every module:
//!
//! 1. Entry modules stay pinned to their own entry chunk.
//! 2. Otherwise the applicable cache group with the highest priority (ties:
//!    first declared) claims the module.
//! 3. Otherwise the module lands in the default chunk of whoever loads it:
//!    the entry chunk for a single entry, `shared~<entries>` for several,
//!    the async root's chunk for a single deferred import, or
//!    `shared~<roots>` for several.
//!
//! Every entry additionally gets `runtime~<entry>`, which never holds module
//! code.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

use super::group::{self, CacheGroup, TieBreak};
use super::reach::{ModuleReach, Reachability};
use crate::graph::{ModuleGraph, ModuleId};

/// Prefix of per-entry runtime chunks.
pub const RUNTIME_PREFIX: &str = "runtime~";
/// Prefix of default chunks shared by several loaders.
pub const SHARED_PREFIX: &str = "shared~";

/// Planning failure. Always fatal.
#[derive(Debug, Error)]
pub enum ChunkPlanningError {
    #[error("cache group `{name}` is declared more than once with conflicting `duplicate` settings")]
    ConflictingGroup { name: String },

    #[error("chunk name `{name}` is claimed by both {first} and {second}")]
    NameClash {
        name: String,
        first: String,
        second: String,
    },

    #[error("entry `{entry}` points at `{module}`, which is not in the module graph")]
    UnknownEntry { entry: String, module: ModuleId },
}

/// A planned chunk.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub name: String,
    /// Members in first-visit order. Empty for runtime chunks.
    pub modules: Vec<ModuleId>,
    pub is_runtime: bool,
    pub is_entry: bool,
    /// Loaded on initial page load by at least one entry.
    pub initial: bool,
    /// Entries loading this chunk initially.
    pub entries: BTreeSet<String>,
    /// Deferred imports that need this chunk.
    pub async_roots: BTreeSet<ModuleId>,
}

impl Chunk {
    fn new(name: String) -> Self {
        Self {
            name,
            modules: Vec::new(),
            is_runtime: false,
            is_entry: false,
            initial: false,
            entries: BTreeSet::new(),
            async_roots: BTreeSet::new(),
        }
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.modules.contains(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Loading plan of one entry point.
#[derive(Debug, Clone, Serialize)]
pub struct EntryPlan {
    /// Module executed once every initial chunk is present.
    pub module: ModuleId,
    pub chunk: String,
    pub runtime: String,
    /// Chunks loaded on page load, the entry's own chunk last.
    pub initial_chunks: Vec<String>,
}

/// Result of [`ChunkPlanner::plan`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChunkPlan {
    /// Runtime chunks, then entry chunks, then the rest in discovery order.
    pub chunks: Vec<Chunk>,
    pub entrypoints: BTreeMap<String, EntryPlan>,
    /// Chunks to fetch before a deferred import can be required.
    pub async_chunks: BTreeMap<ModuleId, Vec<String>>,
    /// Modules no entry reaches.
    pub orphans: Vec<ModuleId>,
}

impl ChunkPlan {
    pub fn chunk(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.name == name)
    }

    /// Every chunk containing `id` (several only under duplicate groups).
    #[cfg(test)]
    pub fn chunks_of<'a>(&'a self, id: &'a ModuleId) -> impl Iterator<Item = &'a Chunk> + 'a {
        self.chunks.iter().filter(move |c| c.contains(id))
    }
}

/// Who created a chunk name. Two different origins on one name is a clash.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Origin {
    Entry(String),
    Runtime(String),
    Group(String),
    Shared,
    Async(ModuleId),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry(name) => write!(f, "entry `{name}`"),
            Self::Runtime(name) => write!(f, "the runtime of entry `{name}`"),
            Self::Group(name) => write!(f, "cache group `{name}`"),
            Self::Shared => f.write_str("a shared default chunk"),
            Self::Async(root) => write!(f, "deferred import `{root}`"),
        }
    }
}

/// One module's target chunk and the loaders that chunk serves.
struct Target {
    name: String,
    origin: Origin,
    entries: BTreeSet<String>,
    async_roots: BTreeSet<ModuleId>,
}

#[derive(Default)]
struct PlanBuilder {
    chunks: Vec<Chunk>,
    origins: Vec<Origin>,
    index: FxHashMap<String, usize>,
}

impl PlanBuilder {
    fn open(&mut self, name: &str, origin: Origin) -> Result<&mut Chunk, ChunkPlanningError> {
        if let Some(&i) = self.index.get(name) {
            if self.origins[i] != origin {
                return Err(ChunkPlanningError::NameClash {
                    name: name.to_string(),
                    first: self.origins[i].to_string(),
                    second: origin.to_string(),
                });
            }
            return Ok(&mut self.chunks[i]);
        }
        self.index.insert(name.to_string(), self.chunks.len());
        self.chunks.push(Chunk::new(name.to_string()));
        self.origins.push(origin);
        let last = self.chunks.len() - 1;
        Ok(&mut self.chunks[last])
    }

    fn add(&mut self, id: &ModuleId, target: Target) -> Result<(), ChunkPlanningError> {
        let chunk = self.open(&target.name, target.origin)?;
        chunk.modules.push(id.clone());
        chunk.initial |= !target.entries.is_empty();
        chunk.entries.extend(target.entries);
        chunk.async_roots.extend(target.async_roots);
        Ok(())
    }
}

/// Partitions reachable modules into chunks under an ordered cache-group list.
#[derive(Debug, Clone, Copy)]
pub struct ChunkPlanner<'a> {
    groups: &'a [CacheGroup],
    tie_break: TieBreak,
}

impl<'a> ChunkPlanner<'a> {
    pub fn new(groups: &'a [CacheGroup]) -> Self {
        Self {
            groups,
            tie_break: TieBreak::First,
        }
    }

    /// Policy for applicable groups of equal priority.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn plan(
        &self,
        graph: &ModuleGraph,
        entries: &BTreeMap<String, ModuleId>,
    ) -> Result<ChunkPlan, ChunkPlanningError> {
        self.check_groups(entries)?;
        for (entry, module) in entries {
            if !graph.contains(module) {
                return Err(ChunkPlanningError::UnknownEntry {
                    entry: entry.clone(),
                    module: module.clone(),
                });
            }
        }

        let reach = Reachability::compute(graph, entries);
        let mut builder = PlanBuilder::default();

        for name in entries.keys() {
            let runtime = builder.open(&runtime_name(name), Origin::Runtime(name.clone()))?;
            runtime.is_runtime = true;
            runtime.initial = true;
            runtime.entries.insert(name.clone());
        }
        // First entry wins when two entries share a module.
        let mut pinned: FxHashMap<&ModuleId, &String> = FxHashMap::default();
        for (name, module) in entries {
            let chunk = builder.open(name, Origin::Entry(name.clone()))?;
            chunk.is_entry = true;
            chunk.initial = true;
            chunk.entries.insert(name.clone());
            pinned.entry(module).or_insert(name);
        }

        for id in reach.order() {
            let Some(module_reach) = reach.get(id) else {
                continue;
            };
            for target in self.targets(id, module_reach, pinned.get(id).copied()) {
                builder.add(id, target)?;
            }
        }

        let chunks = builder.chunks;
        let entrypoints = entries
            .iter()
            .map(|(name, module)| {
                let mut initial_chunks: Vec<String> = chunks
                    .iter()
                    .filter(|c| !c.is_runtime && c.name != *name && c.entries.contains(name))
                    .map(|c| c.name.clone())
                    .collect();
                initial_chunks.push(name.clone());
                let plan = EntryPlan {
                    module: module.clone(),
                    chunk: name.clone(),
                    runtime: runtime_name(name),
                    initial_chunks,
                };
                (name.clone(), plan)
            })
            .collect();

        let async_chunks = reach
            .roots()
            .iter()
            .map(|root| {
                let names = chunks
                    .iter()
                    .filter(|c| !c.is_runtime && c.async_roots.contains(root))
                    .map(|c| c.name.clone())
                    .collect();
                (root.clone(), names)
            })
            .collect();

        let orphans = graph
            .modules()
            .iter()
            .filter(|m| !reach.is_reachable(&m.id))
            .map(|m| m.id.clone())
            .collect();

        Ok(ChunkPlan {
            chunks,
            entrypoints,
            async_chunks,
            orphans,
        })
    }

    /// Chunks one module belongs to.
    fn targets(&self, id: &ModuleId, reach: &ModuleReach, pinned: Option<&String>) -> Vec<Target> {
        if let Some(entry) = pinned {
            return vec![Target {
                name: entry.clone(),
                origin: Origin::Entry(entry.clone()),
                entries: reach.initial.clone(),
                async_roots: reach.async_roots.clone(),
            }];
        }

        if let Some(group) = group::resolve(self.groups, self.tie_break, id, reach) {
            if group.duplicate {
                return duplicate_targets(group, reach);
            }
            return vec![Target {
                name: group.name.clone(),
                origin: Origin::Group(group.name.clone()),
                entries: reach.initial.clone(),
                async_roots: reach.async_roots.clone(),
            }];
        }

        let (name, origin) = if let Some(entry) = single(&reach.initial) {
            (entry.clone(), Origin::Entry(entry.clone()))
        } else if !reach.initial.is_empty() {
            (shared_name(reach.initial.iter().cloned()), Origin::Shared)
        } else if let Some(root) = single(&reach.async_roots) {
            (root.chunk_name(), Origin::Async(root.clone()))
        } else {
            let names: BTreeSet<String> = reach.async_roots.iter().map(ModuleId::chunk_name).collect();
            (shared_name(names), Origin::Shared)
        };

        vec![Target {
            name,
            origin,
            entries: reach.initial.clone(),
            async_roots: reach.async_roots.clone(),
        }]
    }

    fn check_groups(&self, entries: &BTreeMap<String, ModuleId>) -> Result<(), ChunkPlanningError> {
        let mut seen: FxHashMap<&str, bool> = FxHashMap::default();
        for group in self.groups {
            match seen.get(group.name.as_str()) {
                Some(&duplicate) if duplicate != group.duplicate => {
                    return Err(ChunkPlanningError::ConflictingGroup {
                        name: group.name.clone(),
                    });
                }
                _ => {
                    seen.insert(&group.name, group.duplicate);
                }
            }

            if entries.contains_key(&group.name) {
                return Err(ChunkPlanningError::NameClash {
                    name: group.name.clone(),
                    first: Origin::Entry(group.name.clone()).to_string(),
                    second: Origin::Group(group.name.clone()).to_string(),
                });
            }
            if let Some(entry) = group.name.strip_prefix(RUNTIME_PREFIX)
                && entries.contains_key(entry)
            {
                return Err(ChunkPlanningError::NameClash {
                    name: group.name.clone(),
                    first: Origin::Runtime(entry.to_string()).to_string(),
                    second: Origin::Group(group.name.clone()).to_string(),
                });
            }
        }
        Ok(())
    }
}

/// One target per owner: `<group>~<entry>` or `<group>~<async chunk>`.
fn duplicate_targets(group: &CacheGroup, reach: &ModuleReach) -> Vec<Target> {
    let by_entry = reach.initial.iter().map(|entry| Target {
        name: format!("{}~{entry}", group.name),
        origin: Origin::Group(group.name.clone()),
        entries: BTreeSet::from([entry.clone()]),
        async_roots: BTreeSet::new(),
    });
    let by_root = reach.async_roots.iter().map(|root| Target {
        name: format!("{}~{}", group.name, root.chunk_name()),
        origin: Origin::Group(group.name.clone()),
        entries: BTreeSet::new(),
        async_roots: BTreeSet::from([root.clone()]),
    });
    by_entry.chain(by_root).collect()
}

fn single<T>(set: &BTreeSet<T>) -> Option<&T> {
    if set.len() == 1 { set.iter().next() } else { None }
}

pub fn runtime_name(entry: &str) -> String {
    format!("{RUNTIME_PREFIX}{entry}")
}

fn shared_name(owners: impl IntoIterator<Item = String>) -> String {
    let owners: Vec<String> = owners.into_iter().collect();
    format!("{SHARED_PREFIX}{}", owners.join("~"))
}
