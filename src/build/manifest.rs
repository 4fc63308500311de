//! Chunk manifest: chunk names and asset ids → output paths.
//!
//! Written as `manifest.json` and injected into pages as the
//! `self.__bale_manifest` global the runtime resolves URLs from:
//!
//! ```text
//! self.__bale_manifest = {"chunks":{"main":{"js":"js/main.1a2b3c4d.js"}},"assets":{"src/logo.png":"asset/imgs/9f8e7d6c5b.png"}};
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use crate::chunk::ChunkPlan;
use crate::utils::html::script_safe;

/// Output files of one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkFiles {
    pub js: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub public_path: String,
    /// Entry name → files in load order (styles, runtime, initial chunks).
    pub entrypoints: BTreeMap<String, Vec<String>>,
    pub chunks: BTreeMap<String, ChunkFiles>,
    /// Emitted asset module id → path.
    pub assets: BTreeMap<String, String>,
}

impl Manifest {
    pub const FILE: &'static str = "manifest.json";

    pub fn new(
        public_path: &str,
        plan: &ChunkPlan,
        chunks: BTreeMap<String, ChunkFiles>,
        assets: BTreeMap<String, String>,
    ) -> Self {
        let mut manifest = Self {
            public_path: public_path.to_string(),
            entrypoints: BTreeMap::new(),
            chunks,
            assets,
        };
        for (name, entry) in &plan.entrypoints {
            let files = manifest.load_order(&entry.runtime, &entry.initial_chunks);
            manifest.entrypoints.insert(name.clone(), files);
        }
        manifest
    }

    fn load_order(&self, runtime: &str, initial: &[String]) -> Vec<String> {
        let initial: Vec<_> = initial.iter().filter_map(|n| self.chunks.get(n)).collect();
        let styles = initial.iter().filter_map(|files| files.css.clone());
        let scripts = self
            .chunks
            .get(runtime)
            .into_iter()
            .chain(initial.iter().copied())
            .map(|files| files.js.clone());
        styles.chain(scripts).collect()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut json = serde_json::to_vec_pretty(self)?;
        json.push(b'\n');
        Ok(json)
    }

    /// Statement defining the runtime's manifest global.
    pub fn global_script(&self) -> String {
        let global = json!({ "chunks": self.chunks, "assets": self.assets });
        format!("self.__bale_manifest = {};", script_safe(&global.to_string()))
    }
}
