//! Final-artifact minimizers.
//!
//! Minimizers are pure functions over bytes, grouped by [`ArtifactClass`]
//! and run in the fixed order style → script → image. A minimizer that fails
//! or grows its input leaves the original bytes in place; the orchestrator
//! turns that into a diagnostic.

mod css;
mod image;
mod js;

pub use css::CssMinimizer;
pub use self::image::ImageMinimizer;
pub use js::ScriptMinimizer;

use serde::Serialize;
use thiserror::Error;

use crate::naming::dotted_ext;

/// Artifact categories, in minimization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactClass {
    Style,
    Script,
    Image,
    Other,
}

impl ArtifactClass {
    /// Classes that have minimizers, in the order they run.
    pub const MINIMIZE_ORDER: [Self; 3] = [Self::Style, Self::Script, Self::Image];

    pub fn of_path(path: &str) -> Self {
        match dotted_ext(path).to_ascii_lowercase().as_str() {
            ".css" => Self::Style,
            ".js" | ".mjs" | ".cjs" => Self::Script,
            ".png" | ".svg" | ".jpg" | ".jpeg" | ".gif" | ".webp" | ".avif" | ".ico" | ".bmp" => {
                Self::Image
            }
            _ => Self::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Script => "script",
            Self::Image => "image",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Error)]
pub enum MinifyError {
    #[error("parse failed: {0}")]
    Parse(String),

    #[error("print failed: {0}")]
    Print(String),

    #[error("image codec: {0}")]
    Image(#[from] ::image::ImageError),

    #[error("svg: {0}")]
    Svg(#[from] usvg::Error),
}

/// A byte-level minimizer for one artifact class.
pub trait Minimizer: Send + Sync {
    fn name(&self) -> &'static str;

    fn class(&self) -> ArtifactClass;

    /// Whether this minimizer understands the artifact at `path`.
    fn accepts(&self, _path: &str) -> bool {
        true
    }

    fn minimize(&self, path: &str, input: &[u8]) -> Result<Vec<u8>, MinifyError>;
}

/// Why minimized output was discarded.
#[derive(Debug)]
pub enum Fallback {
    Failed(MinifyError),
    Larger { original: usize, minimized: usize },
}

impl std::fmt::Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed(err) => write!(f, "{err}"),
            Self::Larger { original, minimized } => {
                write!(f, "output grew from {original} to {minimized} bytes")
            }
        }
    }
}

/// Run `minimizer`, keeping `input` when it fails or would grow.
pub fn minimize_or_keep(minimizer: &dyn Minimizer, path: &str, input: Vec<u8>) -> (Vec<u8>, Option<Fallback>) {
    match minimizer.minimize(path, &input) {
        Ok(out) if out.len() <= input.len() => (out, None),
        Ok(out) => {
            let fallback = Fallback::Larger {
                original: input.len(),
                minimized: out.len(),
            };
            (input, Some(fallback))
        }
        Err(err) => (input, Some(Fallback::Failed(err))),
    }
}

/// The standard minimizer set, in execution order.
pub fn default_minimizers(drop_console: bool) -> Vec<Box<dyn Minimizer>> {
    vec![
        Box::new(CssMinimizer),
        Box::new(ScriptMinimizer { drop_console }),
        Box::new(ImageMinimizer),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pad;

    impl Minimizer for Pad {
        fn name(&self) -> &'static str {
            "pad"
        }

        fn class(&self) -> ArtifactClass {
            ArtifactClass::Other
        }

        fn minimize(&self, _path: &str, input: &[u8]) -> Result<Vec<u8>, MinifyError> {
            let mut out = input.to_vec();
            out.push(b' ');
            Ok(out)
        }
    }

    #[test]
    fn test_larger_output_falls_back() {
        let (bytes, fallback) = minimize_or_keep(&Pad, "a.txt", b"abc".to_vec());
        assert_eq!(bytes, b"abc");
        assert!(matches!(
            fallback,
            Some(Fallback::Larger {
                original: 3,
                minimized: 4
            })
        ));
    }

    #[test]
    fn test_default_order() {
        let classes: Vec<_> = default_minimizers(true).iter().map(|m| m.class()).collect();
        assert_eq!(classes, ArtifactClass::MINIMIZE_ORDER);
    }

    #[test]
    fn test_class_of_path() {
        assert_eq!(ArtifactClass::of_path("js/main.1a2b.js"), ArtifactClass::Script);
        assert_eq!(ArtifactClass::of_path("asset/css/main.css"), ArtifactClass::Style);
        assert_eq!(ArtifactClass::of_path("asset/imgs/x.PNG?v=1"), ArtifactClass::Image);
        assert_eq!(ArtifactClass::of_path("index.html"), ArtifactClass::Other);
    }
}
