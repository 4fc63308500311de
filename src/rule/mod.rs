//! Module classification rules.
//!
//! Rules are compiled once from configuration into an immutable, ordered
//! list. Matching is first-match-wins over the module's path (the id without
//! its resource query); a module matching nothing passes through untouched
//! and is routed by its own kind.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::section::{RuleConfig, parse_template};
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::graph::{Module, ModuleKind};
use crate::naming::FilenameTemplate;
use crate::transform::{TransformChain, TransformRegistry};

/// Output routing declared by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Routing {
    Style,
    Script,
    Asset,
}

impl Routing {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Script => "script",
            Self::Asset => "asset",
        }
    }
}

/// A compiled classification rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Declaration index in `module.rules`.
    pub index: usize,
    pub test: Regex,
    pub exclude: Option<Regex>,
    pub chain: TransformChain,
    pub routing: Routing,
    /// Overrides the global inline threshold for matching assets.
    pub inline_limit: Option<u64>,
    /// Never inline, always emit a standalone file.
    pub resource: bool,
    /// Overrides the kind's default asset filename template.
    pub filename: Option<FilenameTemplate>,
}

impl Rule {
    #[cfg(test)]
    pub fn new(index: usize, test: Regex, routing: Routing) -> Self {
        Self {
            index,
            test,
            exclude: None,
            chain: TransformChain::empty(),
            routing,
            inline_limit: None,
            resource: false,
            filename: None,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.test.is_match(path) && !self.exclude.as_ref().is_some_and(|re| re.is_match(path))
    }

    /// Kind the module is treated as once this rule routed it.
    ///
    /// Asset routing keeps asset kinds and turns anything else into a
    /// plain resource (`Media`).
    pub fn effective_kind(&self, kind: ModuleKind) -> ModuleKind {
        match self.routing {
            Routing::Style => ModuleKind::Style,
            Routing::Script => ModuleKind::Script,
            Routing::Asset if kind.is_inlineable() => kind,
            Routing::Asset => ModuleKind::Media,
        }
    }
}

/// Ordered rule list with first-match-wins lookup.
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    rules: Vec<Rule>,
}

impl RuleMatcher {
    #[cfg(test)]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile `module.rules`, resolving every transform name against
    /// `registry`. Malformed patterns, unknown transforms and bad templates
    /// are all recorded in `diag`; the matcher only holds the valid rules.
    pub fn compile(configs: &[RuleConfig], registry: &TransformRegistry, diag: &mut ConfigDiagnostics) -> Self {
        let rules = configs
            .iter()
            .enumerate()
            .filter_map(|(index, config)| compile_rule(index, config, registry, diag))
            .collect();
        Self { rules }
    }

    /// First rule matching the module's path, or `None` for pass-through.
    pub fn match_module(&self, module: &Module) -> Option<&Rule> {
        self.match_path(module.id.path())
    }

    pub fn match_path(&self, path: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

fn compile_regex(source: &str, field: FieldPath, diag: &mut ConfigDiagnostics) -> Option<Regex> {
    match Regex::new(source) {
        Ok(re) => Some(re),
        Err(err) => {
            diag.error_with_hint(
                field,
                format!("invalid pattern `{source}`: {err}"),
                "patterns are regular expressions matched against the module path",
            );
            None
        }
    }
}

fn compile_rule(
    index: usize,
    config: &RuleConfig,
    registry: &TransformRegistry,
    diag: &mut ConfigDiagnostics,
) -> Option<Rule> {
    let field = |name: &str| FieldPath::indexed("module.rules", index, name);

    let test = compile_regex(&config.test, field("test"), diag);
    let exclude = config
        .exclude
        .as_deref()
        .map(|source| compile_regex(source, field("exclude"), diag));
    let chain = match registry.resolve(&config.transforms) {
        Ok(chain) => Some(chain),
        Err(unknown) => {
            diag.error_with_hint(
                field("use"),
                format!("unknown transform `{unknown}`"),
                format!("registered transforms: {}", registry.names().join(", ")),
            );
            None
        }
    };
    let filename = config
        .filename
        .as_deref()
        .map(|source| parse_template(source, field("filename"), diag));

    if config.routing != Routing::Asset {
        for (set, name) in [
            (config.inline_limit.is_some(), "inline_limit"),
            (config.resource, "resource"),
            (config.filename.is_some(), "filename"),
        ] {
            if set {
                diag.warn(field(name), "only applies to `type = \"asset\"` rules");
            }
        }
    }

    Some(Rule {
        index,
        test: test?,
        exclude: match exclude {
            Some(re) => Some(re?),
            None => None,
        },
        chain: chain?,
        routing: config.routing,
        inline_limit: config.inline_limit,
        resource: config.resource,
        filename: match filename {
            Some(template) => Some(template?),
            None => None,
        },
    })
}
