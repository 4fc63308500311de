//! Non-fatal build findings.

use std::fmt;

use crate::config::section::Severity;
use crate::graph::{ModuleId, ModuleKind};
use crate::minify::Fallback;
use crate::transform::TransformError;
use crate::utils::plural::plural_count;

#[derive(Debug)]
pub enum Diagnostic {
    /// Supplied module that no entry reaches; excluded from every chunk.
    Orphan { module: ModuleId },
    /// Transform failure. `Warn` kept the raw content; `Fatal` aborted the build.
    TransformFailed {
        module: ModuleId,
        kind: ModuleKind,
        severity: Severity,
        message: String,
    },
    /// A minimizer failed or grew its input; the unminimized bytes were kept.
    MinimizerFallback {
        artifact: String,
        minimizer: &'static str,
        reason: Fallback,
    },
}

impl Diagnostic {
    pub fn transform_failed(kind: ModuleKind, severity: Severity, error: &TransformError) -> Self {
        let mut message = error.to_string();
        if let Some(source) = std::error::Error::source(error) {
            message.push_str(&format!(": {source}"));
        }
        Self::TransformFailed {
            module: error.module().clone(),
            kind,
            severity,
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Orphan { module } => write!(f, "`{module}` is not reachable from any entry"),
            Self::TransformFailed {
                kind,
                severity,
                message,
                ..
            } => {
                let severity = match severity {
                    Severity::Fatal => "fatal",
                    Severity::Warn => "kept raw content",
                };
                write!(f, "{} {message} ({severity})", kind.as_str())
            }
            Self::MinimizerFallback {
                artifact,
                minimizer,
                reason,
            } => write!(f, "{minimizer} minimizer kept `{artifact}` unchanged: {reason}"),
        }
    }
}

/// Ordered list of diagnostics from one build.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn orphans(&self) -> impl Iterator<Item = &ModuleId> {
        self.items.iter().filter_map(|d| match d {
            Diagnostic::Orphan { module } => Some(module),
            _ => None,
        })
    }

    /// Print every diagnostic under one warning header.
    pub fn print(&self) {
        if self.items.is_empty() {
            return;
        }
        crate::log!("warning"; "{}:", plural_count(self.items.len(), "diagnostic"));
        for item in &self.items {
            eprintln!("- {item}");
        }
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
