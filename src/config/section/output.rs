//! `[output]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [output]
//! dir = "dist"
//! public_path = "/"
//! clean = true
//! filename = "js/[name].[contenthash:8].js"
//! chunk_filename = "js/[name].[contenthash:8].chunk.js"
//! inline_limit = 10240
//!
//! [output.assets]
//! images = "asset/imgs/[hash:10][ext][query]"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::asset::AssetDir;
use crate::config::{BuildMode, ConfigDiagnostics, FieldPath};
use crate::naming::FilenameTemplate;

/// Default data-URI threshold in bytes.
pub const DEFAULT_INLINE_LIMIT: u64 = 10 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory (relative to the project root).
    pub dir: PathBuf,
    /// URL prefix of every emitted file.
    pub public_path: String,
    /// Replace the output directory instead of writing into it.
    pub clean: bool,
    /// Entry and runtime chunk scripts.
    pub filename: Option<String>,
    /// Non-entry chunk scripts.
    pub chunk_filename: Option<String>,
    /// Extracted styles of entry chunks.
    pub css_filename: Option<String>,
    /// Extracted styles of non-entry chunks.
    pub css_chunk_filename: Option<String>,
    /// Inlineable assets up to this many bytes become data URIs.
    pub inline_limit: u64,
    pub assets: AssetTemplatesConfig,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "dist".into(),
            public_path: "/".into(),
            clean: true,
            filename: None,
            chunk_filename: None,
            css_filename: None,
            css_chunk_filename: None,
            inline_limit: DEFAULT_INLINE_LIMIT,
            assets: AssetTemplatesConfig::default(),
        }
    }
}

/// Per-directory overrides of standalone asset filenames.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetTemplatesConfig {
    pub images: Option<String>,
    pub media: Option<String>,
    pub fonts: Option<String>,
    pub scripts: Option<String>,
    pub styles: Option<String>,
}

impl AssetTemplatesConfig {
    fn get(&self, dir: AssetDir) -> Option<&str> {
        match dir {
            AssetDir::Images => self.images.as_deref(),
            AssetDir::Media => self.media.as_deref(),
            AssetDir::Fonts => self.fonts.as_deref(),
            AssetDir::Scripts => self.scripts.as_deref(),
            AssetDir::Styles => self.styles.as_deref(),
        }
    }
}

/// Parsed filename templates.
#[derive(Debug, Clone)]
pub struct OutputTemplates {
    pub filename: FilenameTemplate,
    pub chunk_filename: FilenameTemplate,
    pub css_filename: FilenameTemplate,
    pub css_chunk_filename: FilenameTemplate,
    assets: AssetTemplates,
}

#[derive(Debug, Clone)]
struct AssetTemplates {
    images: FilenameTemplate,
    media: FilenameTemplate,
    fonts: FilenameTemplate,
    scripts: FilenameTemplate,
    styles: FilenameTemplate,
}

impl OutputTemplates {
    /// Template for standalone files routed to `dir`.
    pub fn asset(&self, dir: AssetDir) -> &FilenameTemplate {
        match dir {
            AssetDir::Images => &self.assets.images,
            AssetDir::Media => &self.assets.media,
            AssetDir::Fonts => &self.assets.fonts,
            AssetDir::Scripts => &self.assets.scripts,
            AssetDir::Styles => &self.assets.styles,
        }
    }

    /// Script template of a chunk.
    pub fn script(&self, is_entry_or_runtime: bool) -> &FilenameTemplate {
        if is_entry_or_runtime {
            &self.filename
        } else {
            &self.chunk_filename
        }
    }

    /// Stylesheet template of a chunk.
    pub fn style(&self, is_entry: bool) -> &FilenameTemplate {
        if is_entry {
            &self.css_filename
        } else {
            &self.css_chunk_filename
        }
    }
}

/// Mode-dependent defaults: `(filename, chunk, css, css chunk)`.
fn default_templates(mode: BuildMode) -> [&'static str; 4] {
    match mode {
        BuildMode::Production => [
            "js/[name].[contenthash:8].js",
            "js/[name].[contenthash:8].chunk.js",
            "asset/css/[name].[contenthash:10].css",
            "asset/css/[name].[contenthash:10].chunk.css",
        ],
        BuildMode::Development => [
            "js/[name].js",
            "js/[name].chunk.js",
            "asset/css/[name].css",
            "asset/css/[name].chunk.css",
        ],
    }
}

/// Parse a template, recording a diagnostic on failure.
pub fn parse_template(source: &str, field: FieldPath, diag: &mut ConfigDiagnostics) -> Option<FilenameTemplate> {
    match FilenameTemplate::parse(source) {
        Ok(template) => Some(template),
        Err(err) => {
            diag.error_with_hint(
                field,
                format!("invalid filename template `{source}`: {err}"),
                "supported tokens: [name] [contenthash:N] [hash:N] [ext] [query]",
            );
            None
        }
    }
}

impl OutputConfig {
    pub fn validate_public_path(&self, diag: &mut ConfigDiagnostics) {
        if !self.public_path.is_empty() && !self.public_path.ends_with('/') {
            diag.error_with_hint(
                FieldPath::new("output.public_path"),
                format!("`{}` does not end with `/`", self.public_path),
                format!("use `{}/`", self.public_path),
            );
        }
    }

    pub fn compile(&self, mode: BuildMode, diag: &mut ConfigDiagnostics) -> Option<OutputTemplates> {
        self.validate_public_path(diag);

        let [filename, chunk, css, css_chunk] = default_templates(mode);
        let filename = parse_template(
            self.filename.as_deref().unwrap_or(filename),
            FieldPath::new("output.filename"),
            diag,
        );
        let chunk_filename = parse_template(
            self.chunk_filename.as_deref().unwrap_or(chunk),
            FieldPath::new("output.chunk_filename"),
            diag,
        );
        let css_filename = parse_template(
            self.css_filename.as_deref().unwrap_or(css),
            FieldPath::new("output.css_filename"),
            diag,
        );
        let css_chunk_filename = parse_template(
            self.css_chunk_filename.as_deref().unwrap_or(css_chunk),
            FieldPath::new("output.css_chunk_filename"),
            diag,
        );

        let mut asset = |dir: AssetDir| {
            let source = self
                .assets
                .get(dir)
                .map_or_else(|| dir.default_template(), str::to_string);
            parse_template(&source, FieldPath::keyed("output.assets", dir.config_key()), diag)
        };
        let images = asset(AssetDir::Images);
        let media = asset(AssetDir::Media);
        let fonts = asset(AssetDir::Fonts);
        let scripts = asset(AssetDir::Scripts);
        let styles = asset(AssetDir::Styles);

        Some(OutputTemplates {
            filename: filename?,
            chunk_filename: chunk_filename?,
            css_filename: css_filename?,
            css_chunk_filename: css_chunk_filename?,
            assets: AssetTemplates {
                images: images?,
                media: media?,
                fonts: fonts?,
                scripts: scripts?,
                styles: styles?,
            },
        })
    }
}
