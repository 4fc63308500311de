//! Named output artifacts and the output sink.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::graph::ModuleId;
use crate::naming::strip_query;

/// What produced an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Script or extracted stylesheet of a chunk (runtime chunks included).
    Chunk(String),
    /// Standalone asset emitted for a module.
    Asset(ModuleId),
    /// HTML page of an entry.
    Page(String),
    Manifest,
    /// File copied from the static directory.
    Static,
}

#[derive(Debug, Clone)]
pub struct Artifact {
    /// Output path relative to the output directory, without query.
    pub path: String,
    pub bytes: Vec<u8>,
    pub source: ArtifactSource,
}

/// Flat mapping of output path → bytes.
///
/// Paths are collision-checked by the namer before they get here, so a
/// repeated path always carries identical bytes and is stored once.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    files: BTreeMap<String, Artifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an artifact. Returns false if the path was already present.
    pub fn insert(&mut self, path: &str, bytes: Vec<u8>, source: ArtifactSource) -> bool {
        let path = strip_query(path);
        if self.files.contains_key(path) {
            return false;
        }
        self.files.insert(
            path.to_string(),
            Artifact {
                path: path.to_string(),
                bytes,
                source,
            },
        );
        true
    }

    pub fn get(&self, path: &str) -> Option<&Artifact> {
        self.files.get(strip_query(path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(strip_query(path))
    }

    /// Artifacts ordered by path.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.files.values()
    }

    #[cfg(test)]
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.files.values().map(|a| a.bytes.len()).sum()
    }

    /// Write every artifact under `dir`.
    ///
    /// The set is always staged in a sibling directory first, so a failed
    /// write leaves `dir` untouched. With `clean` the staged tree replaces
    /// `dir`; otherwise each staged file is moved over its counterpart and
    /// unrelated files in `dir` are kept.
    pub fn write_to(&self, dir: &Path, clean: bool) -> io::Result<()> {
        let staging = staging_dir(dir);
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        if let Err(err) = self.write_files(&staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(err);
        }

        if clean {
            if dir.exists() {
                fs::remove_dir_all(dir)?;
            }
            return fs::rename(&staging, dir);
        }

        let moved = self.move_files(&staging, dir);
        let _ = fs::remove_dir_all(&staging);
        moved
    }

    fn move_files(&self, staging: &Path, dir: &Path) -> io::Result<()> {
        for path in self.files.keys() {
            let target = dir.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(staging.join(path), target)?;
        }
        Ok(())
    }

    fn write_files(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        self.files.par_iter().try_for_each(|(path, artifact)| {
            let target = dir.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(target, &artifact.bytes)
        })
    }
}

/// `dist` → `.dist.staging` next to it.
fn staging_dir(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map_or_else(|| "out".into(), |n| n.to_string_lossy());
    dir.with_file_name(format!(".{name}.staging"))
}
