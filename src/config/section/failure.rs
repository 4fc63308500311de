//! `[failure]` section: per-kind transform failure policy.
//!
//! ```toml
//! [failure]
//! script = "fatal"
//! style = "fatal"
//! asset = "warn"
//! ```

use serde::{Deserialize, Serialize};

use crate::graph::ModuleKind;

/// What a transform failure does to the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cancel the build; no artifacts are produced.
    Fatal,
    /// Keep the raw content and record a diagnostic.
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailurePolicy {
    pub script: Severity,
    pub style: Severity,
    /// Images, fonts and media.
    pub asset: Severity,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            script: Severity::Fatal,
            style: Severity::Fatal,
            asset: Severity::Warn,
        }
    }
}

impl FailurePolicy {
    pub fn for_kind(&self, kind: ModuleKind) -> Severity {
        match kind {
            ModuleKind::Script => self.script,
            ModuleKind::Style => self.style,
            ModuleKind::Image | ModuleKind::Font | ModuleKind::Media => self.asset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = FailurePolicy::default();
        assert_eq!(policy.for_kind(ModuleKind::Style), Severity::Fatal);
        assert_eq!(policy.for_kind(ModuleKind::Script), Severity::Fatal);
        assert_eq!(policy.for_kind(ModuleKind::Image), Severity::Warn);
        assert_eq!(policy.for_kind(ModuleKind::Media), Severity::Warn);
    }

    #[test]
    fn test_parse() {
        let policy: FailurePolicy = toml::from_str("style = \"warn\"").unwrap();
        assert_eq!(policy.style, Severity::Warn);
        assert_eq!(policy.script, Severity::Fatal);
    }
}
