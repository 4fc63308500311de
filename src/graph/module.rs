//! Module identity, kind and dependency edges.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ============================================================================
// ModuleId
// ============================================================================

/// Unique module identifier derived from the resolved module path.
///
/// Normalized on construction: backslashes become `/` and a leading `./`
/// is stripped, so `./src\\app.ts` and `src/app.ts` name the same module.
/// A resource query (`img/logo.png?inline`) stays part of the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw.as_ref().replace('\\', "/");
        let trimmed = normalized.trim_start_matches("./");
        Self(trimmed.to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path part of the id (everything before `?`).
    pub fn path(&self) -> &str {
        self.0.split_once('?').map_or(&self.0, |(path, _)| path)
    }

    /// Resource query including the leading `?`, or empty.
    pub fn query(&self) -> &str {
        self.0.find('?').map_or("", |idx| &self.0[idx..])
    }

    /// File name without extension (`src/logo.png` → `logo`).
    pub fn file_stem(&self) -> &str {
        Path::new(self.path())
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Extension without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        Path::new(self.path()).extension().and_then(|e| e.to_str())
    }

    /// Filename-safe chunk name derived from the id (`src/pages/a.tsx` → `src_pages_a_tsx`).
    pub fn chunk_name(&self) -> String {
        self.path()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect()
    }
}

impl From<String> for ModuleId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for ModuleId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<ModuleId> for String {
    fn from(id: ModuleId) -> Self {
        id.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// ModuleKind
// ============================================================================

/// Content kind of a module as supplied by the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Script,
    Style,
    Image,
    Font,
    Media,
}

impl ModuleKind {
    /// Guess the kind from a path extension. Unknown extensions are scripts.
    pub fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("css" | "less" | "sass" | "scss") => Self::Style,
            Some("png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "avif" | "ico" | "bmp") => {
                Self::Image
            }
            Some("ttf" | "otf" | "woff" | "woff2" | "eot") => Self::Font,
            Some("mp4" | "webm" | "mp3" | "avi" | "ogg" | "wav" | "mov" | "flac") => Self::Media,
            _ => Self::Script,
        }
    }

    /// Kinds eligible for data-URI inlining.
    #[inline]
    pub const fn is_inlineable(self) -> bool {
        matches!(self, Self::Image | Self::Font | Self::Media)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
            Self::Image => "image",
            Self::Font => "font",
            Self::Media => "media",
        }
    }
}

// ============================================================================
// Dependency
// ============================================================================

/// Import edge to another module.
///
/// Deserializes from either a plain id string (synchronous import) or
/// `{ id = "...", deferred = true }` for a dynamic import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDependency")]
pub struct Dependency {
    pub id: ModuleId,
    /// Dynamic import: the target is loaded on demand.
    pub deferred: bool,
}

impl Dependency {
    pub fn sync(id: impl Into<ModuleId>) -> Self {
        Self {
            id: id.into(),
            deferred: false,
        }
    }

    pub fn deferred(id: impl Into<ModuleId>) -> Self {
        Self {
            id: id.into(),
            deferred: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDependency {
    Id(ModuleId),
    Edge {
        id: ModuleId,
        #[serde(default)]
        deferred: bool,
    },
}

impl From<RawDependency> for Dependency {
    fn from(raw: RawDependency) -> Self {
        match raw {
            RawDependency::Id(id) => Self::sync(id),
            RawDependency::Edge { id, deferred } => Self { id, deferred },
        }
    }
}

// ============================================================================
// Module
// ============================================================================

/// A module supplied by the external graph.
#[derive(Debug, Clone)]
pub struct Module {
    pub id: ModuleId,
    pub kind: ModuleKind,
    pub content: Vec<u8>,
    pub dependencies: Vec<Dependency>,
}

impl Module {
    /// Create a module, inferring its kind from the id.
    pub fn new(id: impl Into<ModuleId>, content: impl Into<Vec<u8>>) -> Self {
        let id = id.into();
        let kind = ModuleKind::from_path(id.path());
        Self {
            id,
            kind,
            content: content.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: ModuleKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_deps(mut self, deps: impl IntoIterator<Item = Dependency>) -> Self {
        self.dependencies.extend(deps);
        self
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.content.len()
    }
}
