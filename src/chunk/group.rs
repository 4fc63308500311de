//! Cache-group rules and their applicability test.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::reach::ModuleReach;
use crate::graph::ModuleId;

/// Which reachability a cache group accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkMode {
    /// Only modules loaded synchronously by some entry.
    Initial,
    /// Only modules behind deferred import boundaries.
    Async,
    #[default]
    All,
}

impl ChunkMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Async => "async",
            Self::All => "all",
        }
    }

    pub fn accepts(self, reach: &ModuleReach) -> bool {
        match self {
            Self::Initial => !reach.initial.is_empty(),
            Self::Async => reach.initial.is_empty() && !reach.async_roots.is_empty(),
            Self::All => true,
        }
    }
}

/// Which group wins when several applicable groups share the top priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Earliest declared group.
    #[default]
    First,
    /// Latest declared group.
    Last,
}

/// A compiled cache-group rule.
#[derive(Debug, Clone)]
pub struct CacheGroup {
    /// Chunk name modules claimed by this group land in.
    pub name: String,
    /// Matched against the module id; `None` matches every module.
    pub test: Option<Regex>,
    pub priority: i32,
    pub mode: ChunkMode,
    /// Minimum number of owners (entries plus async roots) sharing a module.
    pub min_chunks: usize,
    /// One chunk per owner (`<name>~<owner>`) instead of a single shared chunk.
    pub duplicate: bool,
}

impl CacheGroup {
    #[cfg(test)]
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            test: None,
            priority,
            mode: ChunkMode::All,
            min_chunks: 1,
            duplicate: false,
        }
    }

    #[cfg(test)]
    pub fn with_test(mut self, test: Regex) -> Self {
        self.test = Some(test);
        self
    }

    #[cfg(test)]
    pub fn with_mode(mut self, mode: ChunkMode) -> Self {
        self.mode = mode;
        self
    }

    #[cfg(test)]
    pub fn with_min_chunks(mut self, min_chunks: usize) -> Self {
        self.min_chunks = min_chunks;
        self
    }

    #[cfg(test)]
    pub fn with_duplicate(mut self, duplicate: bool) -> Self {
        self.duplicate = duplicate;
        self
    }

    pub fn applies(&self, id: &ModuleId, reach: &ModuleReach) -> bool {
        self.test.as_ref().is_none_or(|re| re.is_match(id.as_str()))
            && self.mode.accepts(reach)
            && reach.owner_count() >= self.min_chunks
    }
}

/// Highest priority among applicable groups; equal priorities follow `tie_break`.
pub fn resolve<'a>(
    groups: &'a [CacheGroup],
    tie_break: TieBreak,
    id: &ModuleId,
    reach: &ModuleReach,
) -> Option<&'a CacheGroup> {
    let mut best: Option<&CacheGroup> = None;
    for group in groups.iter().filter(|g| g.applies(id, reach)) {
        let wins = match (best, tie_break) {
            (None, _) => true,
            (Some(b), TieBreak::First) => group.priority > b.priority,
            (Some(b), TieBreak::Last) => group.priority >= b.priority,
        };
        if wins {
            best = Some(group);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn initial(entries: &[&str]) -> ModuleReach {
        ModuleReach {
            initial: entries.iter().map(|s| s.to_string()).collect(),
            async_roots: BTreeSet::new(),
        }
    }

    fn deferred(roots: &[&str]) -> ModuleReach {
        ModuleReach {
            initial: BTreeSet::new(),
            async_roots: roots.iter().map(|s| ModuleId::new(s)).collect(),
        }
    }

    #[test]
    fn test_priority_then_declaration_order() {
        let id = ModuleId::new("node_modules/react/index.js");
        let groups = vec![
            CacheGroup::new("libs", 10).with_test(Regex::new("node_modules").unwrap()),
            CacheGroup::new("react", 20).with_test(Regex::new("react").unwrap()),
            CacheGroup::new("also-react", 20).with_test(Regex::new("react").unwrap()),
        ];
        let reach = initial(&["main"]);
        assert_eq!(resolve(&groups, TieBreak::First, &id, &reach).unwrap().name, "react");
        assert_eq!(resolve(&groups, TieBreak::Last, &id, &reach).unwrap().name, "also-react");
    }

    #[test]
    fn test_tie_break_never_beats_higher_priority() {
        let id = ModuleId::new("node_modules/react/index.js");
        let groups = [CacheGroup::new("react", 20), CacheGroup::new("libs", 10)];
        let reach = initial(&["main"]);
        assert_eq!(resolve(&groups, TieBreak::Last, &id, &reach).unwrap().name, "react");
    }

    #[test]
    fn test_mode_filters() {
        let id = ModuleId::new("a.js");
        let only_initial = [CacheGroup::new("g", 0).with_mode(ChunkMode::Initial)];
        let only_async = [CacheGroup::new("g", 0).with_mode(ChunkMode::Async)];

        assert!(resolve(&only_initial, TieBreak::First, &id, &initial(&["main"])).is_some());
        assert!(resolve(&only_initial, TieBreak::First, &id, &deferred(&["lazy.js"])).is_none());
        assert!(resolve(&only_async, TieBreak::First, &id, &deferred(&["lazy.js"])).is_some());
        assert!(resolve(&only_async, TieBreak::First, &id, &initial(&["main"])).is_none());
    }

    #[test]
    fn test_min_chunks_counts_owners() {
        let id = ModuleId::new("utils.js");
        let groups = [CacheGroup::new("common", 0).with_min_chunks(2)];
        assert!(resolve(&groups, TieBreak::First, &id, &initial(&["main"])).is_none());
        assert!(resolve(&groups, TieBreak::First, &id, &initial(&["admin", "main"])).is_some());
    }
}
