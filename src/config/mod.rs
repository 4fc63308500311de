//! Project configuration (`bale.toml`).
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── output     # [output]
//! │   ├── module     # [module] rules
//! │   ├── optimization  # [optimization] minimize, cache groups
//! │   ├── failure    # [failure]
//! │   ├── html       # [html]
//! │   ├── copy       # [copy]
//! │   └── graph      # [graph]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── pipeline       # Pipeline (compiled configuration)
//! └── mod.rs         # BaleConfig (this file)
//! ```
//!
//! Loading is two-phase: serde parses the raw [`BaleConfig`], then
//! [`BaleConfig::compile`] validates every section at once and produces an
//! immutable [`Pipeline`]. All problems are reported together.

mod pipeline;
pub mod section;
pub mod types;
mod util;

pub use pipeline::Pipeline;
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use section::{
    CopyConfig, FailurePolicy, GraphConfig, HtmlConfig, ModuleConfig, OptimizationConfig,
    OutputConfig,
};
use util::find_config_file;

use crate::asset::AssetRouter;
use crate::chunk::RUNTIME_PREFIX;
use crate::cli::BuildArgs;
use crate::graph::ModuleId;
use crate::rule::RuleMatcher;
use crate::transform::TransformRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// build mode
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Minimized output with content-hashed filenames.
    #[default]
    Production,
    /// Readable output with stable filenames.
    Development,
}

impl BuildMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing bale.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BaleConfig {
    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Unknown fields found while parsing (internal use only)
    #[serde(skip)]
    pub ignored: Vec<String>,

    pub mode: BuildMode,

    /// Worker pool size, `0` for available parallelism.
    pub workers: usize,

    /// Entry name → module id.
    pub entry: BTreeMap<String, String>,

    pub graph: GraphConfig,
    pub output: OutputConfig,
    pub module: ModuleConfig,
    pub optimization: OptimizationConfig,
    pub failure: FailurePolicy,
    pub html: HtmlConfig,
    pub copy: CopyConfig,
}

impl BaleConfig {
    /// Locate `name` upward from the current directory and load it.
    pub fn discover(name: &Path) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|err| ConfigError::Io(PathBuf::from("."), err))?;
        let path = find_config_file(name, &cwd).unwrap_or_else(|| cwd.join(name));
        Self::load(&path)
    }

    /// Load configuration from a file; its parent directory becomes the root.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let (mut config, ignored) = Self::parse_with_ignored(&content)?;

        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        config.config_path = path;
        config.ignored = ignored;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let (mut config, ignored) = Self::parse_with_ignored(content)?;
        config.ignored = ignored;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.root_join(&self.output.dir)
    }

    /// Minimization setting after applying the mode default.
    pub fn minimize(&self) -> bool {
        self.optimization
            .minimize
            .unwrap_or(self.mode == BuildMode::Production)
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply build arguments from CLI.
    pub fn apply_build_args(&mut self, args: &BuildArgs) {
        if args.dev {
            self.mode = BuildMode::Development;
        }
        Self::update_option(&mut self.optimization.minimize, args.minify.map(Some).as_ref());
        Self::update_option(&mut self.workers, args.workers.as_ref());
        Self::update_option(&mut self.output.dir, args.output.as_ref());
        if args.clean {
            self.output.clean = true;
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // compilation
    // ========================================================================

    /// Validate every section and compile the immutable [`Pipeline`].
    ///
    /// Errors from all sections are collected into one
    /// [`ConfigError::Diagnostics`].
    pub fn compile(&self, registry: &TransformRegistry) -> Result<Pipeline, ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        for field in &self.ignored {
            diag.warn(FieldPath::from(field.clone()), "unknown field ignored");
        }

        let entries = self.compile_entries(&mut diag);
        let rules = RuleMatcher::compile(&self.module.rules, registry, &mut diag);
        let cache_groups = self.optimization.compile_groups(&mut diag);
        let templates = self.output.compile(self.mode, &mut diag);
        let html = self.html.compile(&self.root, entries.len(), &mut diag);
        let copy = self.copy.compile(&self.root, &mut diag);

        let warnings = diag.into_result()?;
        // A template that failed to parse has already recorded an error.
        let Some(templates) = templates else {
            return Err(ConfigError::Diagnostics(warnings));
        };

        Ok(Pipeline {
            mode: self.mode,
            entries,
            rules,
            router: AssetRouter::new(self.output.inline_limit),
            cache_groups,
            tie_break: self.optimization.tie_break,
            templates,
            public_path: self.output.public_path.clone(),
            minimize: self.minimize(),
            drop_console: self.optimization.drop_console,
            failure: self.failure,
            workers: self.workers,
            html,
            copy,
            warnings,
        })
    }

    fn compile_entries(&self, diag: &mut ConfigDiagnostics) -> BTreeMap<String, ModuleId> {
        if self.entry.is_empty() {
            diag.error_with_hint(
                FieldPath::new("entry"),
                "no entry points configured",
                "add `[entry]` with `main = \"src/index.js\"`",
            );
        }

        let mut entries = BTreeMap::new();
        for (name, module) in &self.entry {
            let field = FieldPath::keyed("entry", name);
            if name.is_empty() || name.contains(['/', '\\']) {
                diag.error(field, format!("`{name}` is not a valid entry name"));
            } else if name.starts_with(RUNTIME_PREFIX) {
                diag.error(field, format!("entry names must not start with `{RUNTIME_PREFIX}`"));
            } else if module.trim().is_empty() {
                diag.error(field, "empty module id");
            } else {
                entries.insert(name.clone(), ModuleId::new(module));
            }
        }
        entries
    }
}

// ============================================================================
// tests
// ============================================================================
