//! Compiled, immutable build pipeline.

use std::collections::BTreeMap;

use super::section::{CopyPlan, FailurePolicy, HtmlPlan, OutputTemplates};
use super::{BuildMode, ConfigDiagnostics};
use crate::asset::AssetRouter;
use crate::chunk::{CacheGroup, TieBreak};
use crate::graph::ModuleId;
use crate::rule::RuleMatcher;

/// Everything a build needs, validated before any module is read.
///
/// Regexes are compiled, transform names resolved into chains, filename
/// templates parsed. Workers share it by reference for the whole build.
#[derive(Debug)]
pub struct Pipeline {
    pub mode: BuildMode,
    /// Entry name → module id, ordered by name.
    pub entries: BTreeMap<String, ModuleId>,
    pub rules: RuleMatcher,
    pub router: AssetRouter,
    pub cache_groups: Vec<CacheGroup>,
    /// Resolves applicable groups of equal priority.
    pub tie_break: TieBreak,
    pub templates: OutputTemplates,
    pub public_path: String,
    pub minimize: bool,
    pub drop_console: bool,
    pub failure: FailurePolicy,
    /// Worker pool size; `0` means available parallelism.
    pub workers: usize,
    pub html: Option<HtmlPlan>,
    pub copy: Option<CopyPlan>,
    /// Non-fatal configuration findings.
    pub warnings: ConfigDiagnostics,
}

impl Pipeline {
    /// Pool size after resolving `0` and clamping to available parallelism.
    pub fn worker_count(&self) -> usize {
        let available = std::thread::available_parallelism().map_or(1, |n| n.get());
        match self.workers {
            0 => available,
            n => n.min(available),
        }
    }
}
