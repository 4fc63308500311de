//! `[copy]` section: static files copied into the output.
//!
//! ```toml
//! [copy]
//! from = "public"
//! to = ""
//! ignore = ["**/index.html"]
//! ```
//!
//! A missing `from` directory is not an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::glob::Glob;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    pub enable: bool,
    pub from: PathBuf,
    /// Directory inside the output, `""` for the output root.
    pub to: String,
    /// Glob patterns relative to `from`.
    pub ignore: Vec<String>,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            enable: true,
            from: "public".into(),
            to: String::new(),
            ignore: vec!["**/index.html".into()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct CopyPlan {
    pub from: PathBuf,
    pub to: String,
    pub ignore: Vec<Glob>,
}

impl CopyConfig {
    pub fn compile(&self, root: &Path, diag: &mut ConfigDiagnostics) -> Option<CopyPlan> {
        if !self.enable {
            return None;
        }
        let ignore = self
            .ignore
            .iter()
            .enumerate()
            .filter_map(|(i, pattern)| match Glob::new(pattern) {
                Ok(glob) => Some(glob),
                Err(err) => {
                    diag.error(
                        FieldPath::keyed("copy.ignore", &i.to_string()),
                        format!("invalid glob `{pattern}`: {err}"),
                    );
                    None
                }
            })
            .collect();
        let to = self.to.trim_matches('/').to_string();
        if to.split('/').any(|seg| seg == "..") {
            diag.error(FieldPath::new("copy.to"), "must stay inside the output directory");
        }
        Some(CopyPlan {
            from: root.join(&self.from),
            to,
            ignore,
        })
    }
}
