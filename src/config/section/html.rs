//! `[html]` section: generated HTML pages.
//!
//! ```toml
//! [html]
//! template = "public/index.html"   # omitted: a minimal page is generated
//! filename = "index.html"          # default: index.html, or [name].html for several entries
//! title = "app"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    pub enable: bool,
    pub template: Option<PathBuf>,
    /// Page path; `[name]` is replaced by the entry name.
    pub filename: Option<String>,
    /// Title of the generated page (ignored with a template).
    pub title: String,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            enable: true,
            template: None,
            filename: None,
            title: "bale".into(),
        }
    }
}

/// Compiled HTML page settings.
#[derive(Debug, Clone)]
pub struct HtmlPlan {
    /// Template contents, read at configuration time.
    pub template: Option<String>,
    pub filename: String,
    pub title: String,
}

impl HtmlPlan {
    pub fn page_path(&self, entry: &str) -> String {
        self.filename.replace("[name]", entry)
    }
}

impl HtmlConfig {
    pub fn compile(&self, root: &Path, entry_count: usize, diag: &mut ConfigDiagnostics) -> Option<HtmlPlan> {
        if !self.enable {
            return None;
        }

        let filename = match &self.filename {
            Some(filename) => filename.clone(),
            None if entry_count > 1 => "[name].html".into(),
            None => "index.html".into(),
        };
        if entry_count > 1 && !filename.contains("[name]") {
            diag.error_with_hint(
                FieldPath::new("html.filename"),
                format!("`{filename}` would be written once per entry"),
                "include `[name]` in the filename",
            );
        }

        let template = match &self.template {
            Some(path) => match fs::read_to_string(root.join(path)) {
                Ok(content) => Some(content),
                Err(err) => {
                    diag.error(
                        FieldPath::new("html.template"),
                        format!("cannot read `{}`: {err}", path.display()),
                    );
                    None
                }
            },
            None => None,
        };

        Some(HtmlPlan {
            template,
            filename,
            title: self.title.clone(),
        })
    }
}
