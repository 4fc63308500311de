//! `[graph]` section: where the CLI reads the module graph from.
//!
//! ```toml
//! [graph]
//! manifest = "modules.json"
//! root = "."     # base directory of file-backed modules
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub manifest: PathBuf,
    pub root: PathBuf,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            manifest: "modules.json".into(),
            root: ".".into(),
        }
    }
}
