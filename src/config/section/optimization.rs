//! `[optimization]` section: minimization and cache groups.
//!
//! # Example
//!
//! ```toml
//! [optimization]
//! minimize = true        # default: true in production, false in development
//! drop_console = true
//! tie_break = "first"   # equal-priority groups: "first" or "last" declared
//!
//! [[optimization.cache_groups]]
//! name = "react"
//! test = '[\\/]node_modules[\\/]react'
//! priority = 20
//! chunks = "initial"
//!
//! [[optimization.cache_groups]]
//! name = "chunk-libs"
//! test = '[\\/]node_modules[\\/]'
//! priority = 10
//! chunks = "initial"
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::chunk::{CacheGroup, ChunkMode, TieBreak};
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    /// Run minimizers over final artifacts. `None` follows the build mode.
    pub minimize: Option<bool>,
    /// Strip `console.*` calls while minimizing scripts.
    pub drop_console: bool,
    /// Which declared group wins among applicable groups of equal priority.
    pub tie_break: TieBreak,
    /// Evaluated by priority, then `tie_break`.
    pub cache_groups: Vec<CacheGroupConfig>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            minimize: None,
            drop_console: true,
            tie_break: TieBreak::First,
            cache_groups: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheGroupConfig {
    pub name: String,
    /// Regex over the module id. Omitted: every module.
    #[serde(default)]
    pub test: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub chunks: ChunkMode,
    #[serde(default = "default_min_chunks")]
    pub min_chunks: usize,
    #[serde(default)]
    pub duplicate: bool,
}

fn default_min_chunks() -> usize {
    1
}

impl OptimizationConfig {
    pub fn compile_groups(&self, diag: &mut ConfigDiagnostics) -> Vec<CacheGroup> {
        self.cache_groups
            .iter()
            .enumerate()
            .filter_map(|(index, config)| config.compile(index, diag))
            .collect()
    }
}

impl CacheGroupConfig {
    fn compile(&self, index: usize, diag: &mut ConfigDiagnostics) -> Option<CacheGroup> {
        let field = |name: &str| FieldPath::indexed("optimization.cache_groups", index, name);
        let mut ok = true;

        if self.name.is_empty() || self.name.contains(['/', '\\']) {
            diag.error(
                field("name"),
                format!("`{}` is not a valid chunk name", self.name),
            );
            ok = false;
        }
        if self.min_chunks == 0 {
            diag.error(field("min_chunks"), "must be at least 1");
            ok = false;
        }
        let test = match self.test.as_deref().map(Regex::new) {
            Some(Ok(re)) => Some(re),
            Some(Err(err)) => {
                diag.error(field("test"), format!("invalid pattern: {err}"));
                ok = false;
                None
            }
            None => None,
        };
        if !ok {
            return None;
        }

        Some(CacheGroup {
            name: self.name.clone(),
            test,
            priority: self.priority,
            mode: self.chunks,
            min_chunks: self.min_chunks,
            duplicate: self.duplicate,
        })
    }
}
