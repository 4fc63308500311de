//! Chunk script and stylesheet rendering.
//!
//! A chunk script registers its module factories with the runtime queue:
//!
//! ```text
//! (self.__bale_chunks = self.__bale_chunks || []).push([["name"], {
//! "src/a.js": function (module, exports, require) {
//! ...
//! },
//! }]);
//! ```
//!
//! Style modules keep an empty factory in the script; their code is
//! concatenated into the chunk's stylesheet instead.

use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use super::Chunk;
use crate::asset::{AssetDir, Placement, RoutedAsset};
use crate::graph::ModuleId;

/// Rendered, not yet minimized or named, chunk buffers.
#[derive(Debug, Clone)]
pub struct RenderedChunk {
    pub name: String,
    pub script: Vec<u8>,
    /// Extracted styles, if the chunk holds any style module.
    pub style: Option<Vec<u8>>,
}

/// A chunked script module whose transformed bytes are not text.
#[derive(Debug, Error)]
#[error("`{module}` in chunk `{chunk}` is not valid UTF-8 script code")]
pub struct RenderError {
    pub chunk: String,
    pub module: ModuleId,
    #[source]
    pub source: std::str::Utf8Error,
}

fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

pub fn render_chunk(chunk: &Chunk, routed: &FxHashMap<ModuleId, RoutedAsset>) -> Result<RenderedChunk, RenderError> {
    let mut script = format!(
        "(self.__bale_chunks = self.__bale_chunks || []).push([[{}], {{\n",
        quote(&chunk.name)
    );
    let mut styles: Vec<&[u8]> = Vec::new();

    for id in &chunk.modules {
        let Some(asset) = routed.get(id) else {
            continue;
        };
        let body = match &asset.placement {
            Placement::Chunked {
                dir: AssetDir::Styles,
            } => {
                styles.push(&asset.output.buffer);
                String::new()
            }
            Placement::Chunked { .. } => std::str::from_utf8(&asset.output.buffer)
                .map_err(|source| RenderError {
                    chunk: chunk.name.clone(),
                    module: id.clone(),
                    source,
                })?
                .to_string(),
            Placement::Inline { data_uri } => format!("module.exports = {};", quote(data_uri)),
            Placement::Emit { .. } => format!("module.exports = require.url({});", quote(id.as_str())),
        };
        script.push_str(&quote(id.as_str()));
        script.push_str(": function (module, exports, require) {\n");
        if !body.is_empty() {
            script.push_str(&body);
            if !body.ends_with('\n') {
                script.push('\n');
            }
        }
        script.push_str("},\n");
    }
    script.push_str("}]);\n");

    let style = (!styles.is_empty()).then(|| styles.join(&b"\n"[..]));
    Ok(RenderedChunk {
        name: chunk.name.clone(),
        script: script.into_bytes(),
        style,
    })
}
