//! `[module]` section configuration: ordered classification rules.
//!
//! # Example
//!
//! ```toml
//! [[module.rules]]
//! test = '\.(js|ts|tsx|jsx)$'
//! exclude = "node_modules"
//! use = ["strip-bom"]
//! type = "script"
//!
//! [[module.rules]]
//! test = '\.(png|jpe?g|gif|svg)$'
//! type = "asset"
//! inline_limit = 10240
//! filename = "asset/imgs/[hash:10][ext][query]"
//!
//! [[module.rules]]
//! test = '\.(ttf|woff2?)$'
//! type = "asset"
//! resource = true
//! ```

use serde::{Deserialize, Serialize};

use crate::rule::Routing;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Evaluated in order; the first matching rule wins.
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Regex over the module path.
    pub test: String,
    /// Regex over the module path that vetoes the rule.
    #[serde(default)]
    pub exclude: Option<String>,
    /// Transform names, applied in order.
    #[serde(default, rename = "use")]
    pub transforms: Vec<String>,
    #[serde(rename = "type")]
    pub routing: Routing,
    /// Per-rule data-URI threshold (asset rules only).
    #[serde(default)]
    pub inline_limit: Option<u64>,
    /// Always emit a standalone file (asset rules only).
    #[serde(default)]
    pub resource: bool,
    /// Standalone filename template (asset rules only).
    #[serde(default)]
    pub filename: Option<String>,
}

impl RuleConfig {
    #[cfg(test)]
    pub fn new(test: impl Into<String>, routing: Routing) -> Self {
        Self {
            test: test.into(),
            exclude: None,
            transforms: Vec::new(),
            routing,
            inline_limit: None,
            resource: false,
            filename: None,
        }
    }
}
