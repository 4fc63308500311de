//! Sequential execution of one module's transform chain.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use super::{PluginError, TransformChain};
use crate::graph::{Module, ModuleId};
use crate::naming::ContentHash;

/// Per-module transform failure.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("transform `{transform}` failed on `{module}`")]
    Failed {
        module: ModuleId,
        transform: String,
        #[source]
        source: PluginError,
    },

    #[error("transform chain for `{module}` cancelled")]
    Cancelled { module: ModuleId },
}

impl TransformError {
    pub fn module(&self) -> &ModuleId {
        match self {
            Self::Failed { module, .. } | Self::Cancelled { module } => module,
        }
    }
}

/// Output of a completed chain, exclusively owned by the caller.
#[derive(Debug, Clone)]
pub struct ProcessedOutput {
    pub module_id: ModuleId,
    pub buffer: Vec<u8>,
    pub content_hash: ContentHash,
    /// Module kind allows data-URI inlining (the size check belongs to the router).
    pub inline_eligible: bool,
}

impl ProcessedOutput {
    #[inline]
    pub fn size(&self) -> usize {
        self.buffer.len()
    }
}

/// Runs transform chains, observing optional cancellation flags between steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformRunner<'a> {
    /// Long-lived flag owned by the caller (Ctrl+C).
    cancel: Option<&'a AtomicBool>,
    /// Flag scoped to one build, raised by a fatal failure.
    abort: Option<&'a AtomicBool>,
}

impl<'a> TransformRunner<'a> {
    #[cfg(test)]
    pub const fn new() -> Self {
        Self {
            cancel: None,
            abort: None,
        }
    }

    /// Abort chains (with [`TransformError::Cancelled`]) once `flag` is set.
    pub const fn with_cancel(flag: &'a AtomicBool) -> Self {
        Self {
            cancel: Some(flag),
            abort: None,
        }
    }

    /// Also abort once `flag` is set.
    pub const fn with_abort(self, flag: &'a AtomicBool) -> Self {
        Self {
            cancel: self.cancel,
            abort: Some(flag),
        }
    }

    fn cancelled(&self) -> bool {
        [self.cancel, self.abort]
            .into_iter()
            .flatten()
            .any(|flag| flag.load(Ordering::Relaxed))
    }

    /// Run `chain` over the module's raw content.
    ///
    /// The first transform receives the raw content, every later one the
    /// previous output. An empty chain passes the content through.
    pub fn run(&self, module: &Module, chain: &TransformChain) -> Result<ProcessedOutput, TransformError> {
        let mut buffer: Option<Vec<u8>> = None;

        for (name, transform) in chain.steps() {
            if self.cancelled() {
                return Err(TransformError::Cancelled {
                    module: module.id.clone(),
                });
            }
            let input = buffer.as_deref().unwrap_or(module.content.as_slice());
            let output = transform.apply(input).map_err(|source| TransformError::Failed {
                module: module.id.clone(),
                transform: name.clone(),
                source,
            })?;
            buffer = Some(output);
        }

        let buffer = buffer.unwrap_or_else(|| module.content.clone());
        Ok(ProcessedOutput {
            module_id: module.id.clone(),
            content_hash: ContentHash::of(&buffer),
            buffer,
            inline_eligible: module.kind.is_inlineable(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformRegistry;
    use std::sync::Mutex;
    use std::sync::Arc;

    fn registry() -> TransformRegistry {
        let mut registry = TransformRegistry::with_builtins();
        registry.register("append-a", |input: &[u8]| -> Result<Vec<u8>, PluginError> {
            let mut out = input.to_vec();
            out.push(b'a');
            Ok(out)
        });
        registry.register("append-b", |input: &[u8]| -> Result<Vec<u8>, PluginError> {
            let mut out = input.to_vec();
            out.push(b'b');
            Ok(out)
        });
        registry.register("fail", |_: &[u8]| -> Result<Vec<u8>, PluginError> {
            Err("syntax error".into())
        });
        registry
    }

    #[test]
    fn test_chain_runs_in_order() {
        let chain = registry()
            .resolve(&["append-a".into(), "append-b".into(), "append-a".into()])
            .unwrap();
        let module = Module::new("a.js", "x");
        let out = TransformRunner::new().run(&module, &chain).unwrap();
        assert_eq!(out.buffer, b"xaba");
        assert_eq!(out.content_hash, ContentHash::of(b"xaba"));
        assert!(!out.inline_eligible);
    }

    #[test]
    fn test_empty_chain_passes_through() {
        let module = Module::new("logo.png", vec![1, 2, 3]);
        let out = TransformRunner::new().run(&module, &TransformChain::empty()).unwrap();
        assert_eq!(out.buffer, vec![1, 2, 3]);
        assert!(out.inline_eligible);
    }

    #[test]
    fn test_failure_aborts_chain() {
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let mut registry = registry();
        registry.register("count", move |input: &[u8]| -> Result<Vec<u8>, PluginError> {
            *counter.lock().unwrap() += 1;
            Ok(input.to_vec())
        });
        let chain = registry
            .resolve(&["fail".into(), "count".into()])
            .unwrap();

        let module = Module::new("a.css", "a{}");
        let err = TransformRunner::new().run(&module, &chain).unwrap_err();
        match &err {
            TransformError::Failed { transform, .. } => assert_eq!(transform, "fail"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.module().as_str(), "a.css");
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_cancelled_before_first_step() {
        let flag = AtomicBool::new(true);
        let chain = registry().resolve(&["append-a".into()]).unwrap();
        let err = TransformRunner::with_cancel(&flag)
            .run(&Module::new("a.js", ""), &chain)
            .unwrap_err();
        assert!(matches!(err, TransformError::Cancelled { .. }));
    }

    #[test]
    fn test_abort_flag_cancels_independently() {
        let cancel = AtomicBool::new(false);
        let abort = AtomicBool::new(true);
        let chain = registry().resolve(&["append-a".into()]).unwrap();
        let module = Module::new("a.js", "");

        let err = TransformRunner::with_cancel(&cancel)
            .with_abort(&abort)
            .run(&module, &chain)
            .unwrap_err();
        assert!(matches!(err, TransformError::Cancelled { .. }));
        assert!(!cancel.load(Ordering::Relaxed));
        assert!(TransformRunner::with_cancel(&cancel).run(&module, &chain).is_ok());
    }
}
