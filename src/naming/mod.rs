//! Content-addressed artifact naming.
//!
//! Names are a pure function of the artifact's bytes plus its template
//! fields: no timestamps, no build counters. [`ArtifactNamer`] additionally
//! remembers every path it handed out so that two different buffers landing
//! on the same path (a truncated-hash collision, or a fixed-name clash)
//! fail the build instead of silently overwriting each other.

mod hash;
mod template;

pub use hash::ContentHash;
pub use template::{FilenameTemplate, NameFields, TemplateError};

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Two artifacts with differing content resolved to the same output path.
#[derive(Debug, Error)]
#[error("artifact path `{path}` claimed by differing content ({first} vs {second})")]
pub struct NamingCollisionError {
    pub path: String,
    pub first: ContentHash,
    pub second: ContentHash,
}

/// Strip the resource query from an artifact path (`a.png?v=1` → `a.png`).
pub fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(file, _)| file)
}

/// Extension of a path including the dot, ignoring any query.
pub fn dotted_ext(path: &str) -> &str {
    let file = strip_query(path);
    let base = file.rsplit('/').next().unwrap_or(file);
    base.rfind('.').map_or("", |idx| &base[idx..])
}

/// Assigns output paths and guards against collisions.
#[derive(Debug, Default)]
pub struct ArtifactNamer {
    assigned: FxHashMap<String, ContentHash>,
}

impl ArtifactNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute a name without registering it.
    pub fn name(template: &FilenameTemplate, name: &str, ext: &str, query: &str, bytes: &[u8]) -> String {
        template.render(&NameFields {
            name,
            ext,
            query,
            hash: ContentHash::of(bytes),
        })
    }

    /// Compute and register a name for `bytes`.
    ///
    /// Registering the same bytes twice under the same path is allowed
    /// (identical assets imported from several places).
    pub fn assign(
        &mut self,
        template: &FilenameTemplate,
        name: &str,
        ext: &str,
        query: &str,
        bytes: &[u8],
    ) -> Result<String, NamingCollisionError> {
        let path = Self::name(template, name, ext, query, bytes);
        self.claim(path, bytes)
    }

    /// Register a fixed path (html page, manifest, copied file).
    pub fn claim(&mut self, path: String, bytes: &[u8]) -> Result<String, NamingCollisionError> {
        let hash = ContentHash::of(bytes);
        match self.assigned.get(strip_query(&path)) {
            Some(&existing) if existing != hash => Err(NamingCollisionError {
                path,
                first: existing,
                second: hash,
            }),
            _ => {
                self.assigned.insert(strip_query(&path).to_string(), hash);
                Ok(path)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(s: &str) -> FilenameTemplate {
        FilenameTemplate::parse(s).unwrap()
    }

    #[test]
    fn test_identical_bytes_identical_names() {
        let t = template("js/[name].[contenthash:10].js");
        let a = ArtifactNamer::name(&t, "main", ".js", "", b"console.log(1)");
        let b = ArtifactNamer::name(&t, "main", ".js", "", b"console.log(1)");
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_byte_change_changes_name() {
        let t = template("js/[name].[contenthash:10].js");
        let a = ArtifactNamer::name(&t, "main", ".js", "", b"console.log(1)");
        let b = ArtifactNamer::name(&t, "main", ".js", "", b"console.log(2)");
        assert_ne!(a, b);
    }

    #[test]
    fn test_distinct_buffers_distinct_names() {
        let t = template("[hash:10]");
        let names: rustc_hash::FxHashSet<_> = (0..2000u32)
            .map(|i| ArtifactNamer::name(&t, "", "", "", &i.to_le_bytes()))
            .collect();
        assert_eq!(names.len(), 2000);
    }

    #[test]
    fn test_assign_same_bytes_twice_is_ok() {
        let mut namer = ArtifactNamer::new();
        let t = template("asset/[hash:10][ext]");
        let a = namer.assign(&t, "logo", ".png", "", b"png").unwrap();
        let b = namer.assign(&t, "logo", ".png", "", b"png").unwrap();
        assert_eq!(a, b);
        assert_eq!(namer.len(), 1);
    }

    #[test]
    fn test_unhashed_template_collision_is_error() {
        let mut namer = ArtifactNamer::new();
        let t = template("js/[name].js");
        namer.assign(&t, "main", ".js", "", b"a").unwrap();
        let err = namer.assign(&t, "main", ".js", "", b"b").unwrap_err();
        assert_eq!(err.path, "js/main.js");
    }

    #[test]
    fn test_claim_ignores_query_for_collisions() {
        let mut namer = ArtifactNamer::new();
        namer.claim("a.png?x=1".into(), b"1").unwrap();
        assert!(namer.claim("a.png?x=2".into(), b"2").is_err());
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(strip_query("a/b.png?v=1"), "a/b.png");
        assert_eq!(dotted_ext("a/b.min.js"), ".js");
        assert_eq!(dotted_ext("a.dir/file"), "");
        assert_eq!(dotted_ext("b.png?v=1"), ".png");
    }
}
