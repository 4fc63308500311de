//! Static directory copy.

use std::fs;
use std::path::PathBuf;

use jwalk::WalkDir;

use super::BuildError;
use crate::config::section::CopyPlan;

/// A file to copy, with its output path.
#[derive(Debug)]
pub struct StaticFile {
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Read every non-ignored file under `plan.from`, sorted by path.
///
/// A missing source directory yields nothing.
pub fn collect_static(plan: &CopyPlan) -> Result<Vec<StaticFile>, BuildError> {
    if !plan.from.is_dir() {
        crate::debug!("copy"; "no static directory at {}", plan.from.display());
        return Ok(Vec::new());
    }

    let mut files: Vec<(String, PathBuf)> = WalkDir::new(&plan.from)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let path = e.path();
            let rel = path
                .strip_prefix(&plan.from)
                .ok()?
                .to_string_lossy()
                .replace('\\', "/");
            Some((rel, path))
        })
        .filter(|(rel, _)| !plan.ignore.iter().any(|glob| glob.is_match(rel)))
        .collect();
    files.sort();

    files
        .into_iter()
        .map(|(rel, path)| {
            let bytes = fs::read(&path).map_err(|err| BuildError::Io(path, err))?;
            let path = if plan.to.is_empty() {
                rel
            } else {
                format!("{}/{rel}", plan.to)
            };
            Ok(StaticFile { path, bytes })
        })
        .collect()
}
