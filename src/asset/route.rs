//! Per-module inline/standalone decision.

use super::{AssetDir, data_uri};
use crate::graph::ModuleKind;
use crate::naming::FilenameTemplate;
use crate::rule::Rule;
use crate::transform::ProcessedOutput;

/// Where a routed module's bytes end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Embedded into the consuming chunk as a data URI.
    Inline { data_uri: String },
    /// Written as its own file under `dir`.
    Emit { dir: AssetDir },
    /// Script or style code, concatenated into chunk artifacts.
    Chunked { dir: AssetDir },
}

impl Placement {
    #[cfg(test)]
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline { .. })
    }

    #[cfg(test)]
    pub fn is_emit(&self) -> bool {
        matches!(self, Self::Emit { .. })
    }
}

/// A processed module together with its final routing decision.
#[derive(Debug, Clone)]
pub struct RoutedAsset {
    pub output: ProcessedOutput,
    /// Kind after rule routing.
    pub kind: ModuleKind,
    pub placement: Placement,
    /// Filename template override from the matching rule.
    pub filename: Option<FilenameTemplate>,
}

/// Applies the size threshold and kind directories.
#[derive(Debug, Clone, Copy)]
pub struct AssetRouter {
    inline_threshold: u64,
}

impl AssetRouter {
    pub const fn new(inline_threshold: u64) -> Self {
        Self { inline_threshold }
    }

    pub const fn inline_threshold(&self) -> u64 {
        self.inline_threshold
    }

    /// Route one processed module. `rule` is the rule that matched it, if any.
    ///
    /// Inlining requires an inlineable kind, no `resource` flag, and
    /// `size <= threshold` (the threshold itself is still inlined).
    pub fn route(&self, output: ProcessedOutput, kind: ModuleKind, rule: Option<&Rule>) -> RoutedAsset {
        let dir = AssetDir::for_kind(kind);
        let placement = if !kind.is_inlineable() {
            Placement::Chunked { dir }
        } else if self.inlines(&output, rule) {
            Placement::Inline {
                data_uri: data_uri(output.module_id.as_str(), &output.buffer),
            }
        } else {
            Placement::Emit { dir }
        };

        RoutedAsset {
            filename: rule.and_then(|r| r.filename.clone()),
            output,
            kind,
            placement,
        }
    }

    fn inlines(&self, output: &ProcessedOutput, rule: Option<&Rule>) -> bool {
        if !output.inline_eligible || rule.is_some_and(|r| r.resource) {
            return false;
        }
        let limit = rule
            .and_then(|r| r.inline_limit)
            .unwrap_or(self.inline_threshold);
        output.size() as u64 <= limit
    }
}
