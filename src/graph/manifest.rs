//! JSON module manifest supplier.
//!
//! Lets the CLI consume a graph produced by an external resolver:
//!
//! ```json
//! {
//!   "modules": [
//!     { "id": "src/index.tsx", "dependencies": ["src/utils.ts", { "id": "src/lazy.tsx", "deferred": true }] },
//!     { "id": "src/utils.ts" },
//!     { "id": "src/logo.png", "kind": "image", "file": "assets/logo.png" },
//!     { "id": "src/inline.css", "content": "body { margin: 0 }" }
//!   ]
//! }
//! ```
//!
//! Content comes from `content` when present, otherwise from `file` (or the
//! id's path) relative to the manifest root.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{Dependency, GraphError, GraphSupplier, Module, ModuleGraph, ModuleId, ModuleKind};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    modules: Vec<ManifestModule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestModule {
    id: ModuleId,
    #[serde(default)]
    kind: Option<ModuleKind>,
    #[serde(default)]
    file: Option<PathBuf>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

/// Reads a module graph from a JSON manifest file.
#[derive(Debug, Clone)]
pub struct ManifestSupplier {
    path: PathBuf,
    root: PathBuf,
}

impl ManifestSupplier {
    /// `root` is the directory module files are resolved against.
    pub fn new(path: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root: root.into(),
        }
    }

    fn read_content(&self, entry: &ManifestModule) -> Result<Vec<u8>, GraphError> {
        if let Some(content) = &entry.content {
            return Ok(content.clone().into_bytes());
        }
        let rel = entry
            .file
            .clone()
            .unwrap_or_else(|| PathBuf::from(entry.id.path()));
        let path = self.root.join(rel);
        fs::read(&path).map_err(|err| GraphError::Io(path, err))
    }

    fn parse(&self, content: &str) -> Result<ModuleGraph, GraphError> {
        let manifest: Manifest = serde_json::from_str(content)
            .map_err(|err| GraphError::Manifest(self.path.clone(), err))?;

        let modules = manifest
            .modules
            .iter()
            .map(|entry| {
                let content = self.read_content(entry)?;
                let mut module = Module::new(entry.id.clone(), content)
                    .with_deps(entry.dependencies.iter().cloned());
                if let Some(kind) = entry.kind {
                    module = module.with_kind(kind);
                }
                Ok(module)
            })
            .collect::<Result<Vec<_>, GraphError>>()?;

        ModuleGraph::new(modules)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl GraphSupplier for ManifestSupplier {
    fn supply(&self) -> Result<ModuleGraph, GraphError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|err| GraphError::Io(self.path.clone(), err))?;
        self.parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_reads_inline_and_file_content() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.js"), "import './a.css'").unwrap();
        fs::write(
            dir.path().join("graph.json"),
            r#"{"modules": [
                {"id": "src/index.js", "dependencies": ["src/a.css", {"id": "src/lazy.js", "deferred": true}]},
                {"id": "src/a.css", "content": "a{}"},
                {"id": "src/lazy.js", "content": "", "kind": "script"}
            ]}"#,
        )
        .unwrap();

        let supplier = ManifestSupplier::new(dir.path().join("graph.json"), dir.path());
        let graph = supplier.supply().unwrap();

        assert_eq!(graph.len(), 3);
        let index = graph.get(&ModuleId::new("src/index.js")).unwrap();
        assert_eq!(index.content, b"import './a.css'");
        assert!(index.dependencies[1].deferred);
        let style = graph.get(&ModuleId::new("src/a.css")).unwrap();
        assert_eq!(style.kind, ModuleKind::Style);
    }

    #[test]
    fn test_manifest_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("graph.json"),
            r#"{"modules": [{"id": "src/missing.js"}]}"#,
        )
        .unwrap();
        let supplier = ManifestSupplier::new(dir.path().join("graph.json"), dir.path());
        assert!(matches!(supplier.supply(), Err(GraphError::Io(..))));
    }

    #[test]
    fn test_manifest_invalid_json() {
        let supplier = ManifestSupplier::new("graph.json", ".");
        assert!(matches!(
            supplier.parse("{\"modules\": [{\"idx\": 1}]}"),
            Err(GraphError::Manifest(..))
        ));
    }
}
