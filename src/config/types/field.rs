//! Config field path used in diagnostics.

use owo_colors::OwoColorize;
use std::borrow::Cow;
use std::fmt;

/// Dotted path of a config field, e.g. `output.public_path` or
/// `module.rules[2].test`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Cow<'static, str>);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(Cow::Borrowed(path))
    }

    /// Field of the `index`-th element of an array section.
    pub fn indexed(section: &str, index: usize, field: &str) -> Self {
        Self(Cow::Owned(format!("{section}[{index}].{field}")))
    }

    /// Field under a keyed table (`entry.main`).
    pub fn keyed(section: &str, key: &str) -> Self {
        Self(Cow::Owned(format!("{section}.{key}")))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self(Cow::Owned(path))
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(FieldPath::new("output.dir").as_str(), "output.dir");
        assert_eq!(FieldPath::indexed("module.rules", 2, "test").as_str(), "module.rules[2].test");
        assert_eq!(FieldPath::keyed("entry", "main").as_str(), "entry.main");
    }
}
