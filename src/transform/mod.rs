//! Opaque transform plugins.
//!
//! A transform is anything implementing [`Transform`]: bytes in, bytes out.
//! Names are resolved against a [`TransformRegistry`] exactly once, while the
//! configuration is compiled, producing a [`TransformChain`] of ready-to-call
//! handles. Workers never look transforms up by name.

mod builtin;
mod runner;

pub use builtin::{NormalizeEol, Passthrough, StripBom};
pub use runner::{ProcessedOutput, TransformError, TransformRunner};

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

/// Error type returned by transform plugins.
pub type PluginError = Box<dyn std::error::Error + Send + Sync>;

/// Byte-buffer transform supplied by a plugin.
pub trait Transform: Send + Sync {
    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, PluginError>;
}

impl<F> Transform for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, PluginError> + Send + Sync,
{
    fn apply(&self, input: &[u8]) -> Result<Vec<u8>, PluginError> {
        self(input)
    }
}

/// Name-keyed table of transforms, built before configuration is compiled.
#[derive(Default, Clone)]
pub struct TransformRegistry {
    table: FxHashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the byte-level built-ins.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("passthrough", Passthrough);
        registry.register("strip-bom", StripBom);
        registry.register("normalize-eol", NormalizeEol);
        registry
    }

    /// Register (or replace) a transform under `name`.
    pub fn register(&mut self, name: impl Into<String>, transform: impl Transform + 'static) {
        self.table.insert(name.into(), Arc::new(transform));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Resolve a list of names into a chain. Returns the first unknown name on failure.
    pub fn resolve(&self, names: &[String]) -> Result<TransformChain, String> {
        let steps = names
            .iter()
            .map(|name| {
                self.table
                    .get(name)
                    .map(|t| (name.clone(), Arc::clone(t)))
                    .ok_or_else(|| name.clone())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TransformChain { steps })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Ordered, resolved transform handles for one rule.
#[derive(Clone, Default)]
pub struct TransformChain {
    steps: Vec<(String, Arc<dyn Transform>)>,
}

impl TransformChain {
    /// Chain with no steps (pass-through).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn steps(&self) -> &[(String, Arc<dyn Transform>)] {
        &self.steps
    }
}

impl fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
