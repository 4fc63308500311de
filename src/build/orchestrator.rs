//! The build driver.
//!
//! ```text
//! supply graph ─► process (rule → transform → route, in parallel)
//!              ─► plan chunks (sequential, after every module is processed)
//!              ─► render chunks + runtimes
//!              ─► minimize (style → script → image)
//!              ─► name (content hashes) ─► manifest, pages, static copy
//! ```
//!
//! Nothing is written here: the result is an [`ArtifactSet`] the caller
//! hands to the output sink. A fatal error returns no artifacts at all.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use rustc_hash::FxHashMap;

use super::artifact::{ArtifactSet, ArtifactSource};
use super::copy::collect_static;
use super::diagnostics::{Diagnostic, Diagnostics};
use super::html::render_page;
use super::manifest::{ChunkFiles, Manifest};
use super::{BuildError, BuildFailure, BuildOutput};
use crate::asset::{Placement, RoutedAsset};
use crate::chunk::{ChunkPlan, ChunkPlanner, Reachability, RenderError, render_chunk, render_runtime};
use crate::config::Pipeline;
use crate::config::section::Severity;
use crate::graph::{GraphSupplier, Module, ModuleGraph, ModuleId, ModuleKind};
use crate::logger::ProgressLine;
use crate::minify::{ArtifactClass, Minimizer, default_minimizers, minimize_or_keep};
use crate::naming::{ArtifactNamer, FilenameTemplate, NamingCollisionError, dotted_ext};
use crate::transform::{TransformChain, TransformError, TransformRunner};
use crate::{debug, debug_do};

// ============================================================================
// pending artifacts
// ============================================================================

/// Where an unnamed buffer came from.
#[derive(Debug)]
enum Slot {
    Script { chunk: usize },
    Style { chunk: usize },
    Asset { id: ModuleId, template: FilenameTemplate },
}

/// A rendered buffer waiting for minimization and naming.
#[derive(Debug)]
struct Pending {
    slot: Slot,
    /// Human-readable name used by minimizers and diagnostics.
    label: String,
    class: ArtifactClass,
    bytes: Vec<u8>,
}

/// Output of processing one module.
struct Processed {
    asset: RoutedAsset,
    /// Failure downgraded to a warning by the failure policy.
    warning: Option<TransformError>,
}

/// A module whose chain failed under a fatal policy.
struct Fatal {
    kind: ModuleKind,
    error: TransformError,
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct Orchestrator<'a> {
    pipeline: &'a Pipeline,
    minimizers: Vec<Box<dyn Minimizer>>,
    cancel: Arc<AtomicBool>,
    progress: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        Self {
            pipeline,
            minimizers: default_minimizers(pipeline.drop_console),
            cancel: Arc::new(AtomicBool::new(false)),
            progress: false,
        }
    }

    /// Share a cancellation flag (set by Ctrl+C). The orchestrator only reads it.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Show a progress line while modules are processed.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Run one complete build.
    pub fn run(&self, supplier: &dyn GraphSupplier) -> Result<BuildOutput, BuildFailure> {
        let mut diagnostics = Diagnostics::new();
        match self.build(supplier, &mut diagnostics) {
            Ok((artifacts, plan, manifest)) => Ok(BuildOutput {
                artifacts,
                plan,
                manifest,
                diagnostics,
            }),
            Err(error) => Err(BuildFailure { error, diagnostics }),
        }
    }

    fn build(
        &self,
        supplier: &dyn GraphSupplier,
        diagnostics: &mut Diagnostics,
    ) -> Result<(ArtifactSet, ChunkPlan, Manifest), BuildError> {
        let pipeline = self.pipeline;
        let graph = supplier.supply()?;
        graph.validate_entries(&pipeline.entries)?;

        let workers = pipeline.worker_count();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("bale-worker-{i}"))
            .build()?;
        debug!("build"; "{} modules, {} workers", graph.len(), workers);

        // Raised by the first fatal failure; lives for this build only.
        let abort = AtomicBool::new(false);
        let routed = self.process(&pool, &graph, &abort, diagnostics)?;

        let plan = ChunkPlanner::new(&pipeline.cache_groups)
            .with_tie_break(pipeline.tie_break)
            .plan(&graph, &pipeline.entries)?;
        diagnostics.extend(
            plan.orphans
                .iter()
                .map(|module| Diagnostic::Orphan { module: module.clone() }),
        );
        debug_do! {
            for chunk in &plan.chunks {
                debug!("plan"; "{} ({} modules)", chunk.name, chunk.len());
            }
        }

        let mut pending = self.render(&pool, &plan, &routed)?;
        if pipeline.minimize {
            self.minimize(&pool, &mut pending, diagnostics)?;
        }
        self.check_cancelled()?;

        let mut namer = ArtifactNamer::new();
        let mut artifacts = ArtifactSet::new();
        let (chunk_files, asset_files) = self.name(pending, &plan, &mut namer, &mut artifacts)?;

        let manifest = Manifest::new(&pipeline.public_path, &plan, chunk_files, asset_files);
        let json = manifest.to_json()?;
        let path = namer.claim(Manifest::FILE.to_string(), &json)?;
        artifacts.insert(&path, json, ArtifactSource::Manifest);

        if let Some(html) = &pipeline.html {
            for (name, entry) in &plan.entrypoints {
                let page = render_page(html, entry, &manifest).into_bytes();
                let path = namer.claim(html.page_path(name), &page)?;
                artifacts.insert(&path, page, ArtifactSource::Page(name.clone()));
            }
        }

        if let Some(copy) = &pipeline.copy {
            for file in collect_static(copy)? {
                let path = namer.claim(file.path, &file.bytes)?;
                artifacts.insert(&path, file.bytes, ArtifactSource::Static);
            }
        }

        Ok((artifacts, plan, manifest))
    }

    fn check_cancelled(&self) -> Result<(), BuildError> {
        if self.cancel.load(Ordering::Relaxed) {
            Err(BuildError::Cancelled)
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // module processing
    // ========================================================================

    /// Transform and route every reachable module.
    ///
    /// A fatal failure raises `abort` so the remaining chains stop early;
    /// the first fatal failure in module order is reported.
    fn process(
        &self,
        pool: &ThreadPool,
        graph: &ModuleGraph,
        abort: &AtomicBool,
        diagnostics: &mut Diagnostics,
    ) -> Result<FxHashMap<ModuleId, RoutedAsset>, BuildError> {
        let reach = Reachability::compute(graph, &self.pipeline.entries);
        let modules: Vec<&Module> = reach.order().iter().filter_map(|id| graph.get(id)).collect();

        let runner = TransformRunner::with_cancel(&self.cancel).with_abort(abort);
        let progress = self
            .progress
            .then(|| ProgressLine::new("build", &[("modules", modules.len())]));
        let results: Vec<Result<Processed, Fatal>> = pool.install(|| {
            modules
                .par_iter()
                .map(|module| {
                    let result = self.process_module(&runner, abort, module);
                    if let Some(progress) = &progress {
                        progress.inc("modules");
                    }
                    result
                })
                .collect()
        });
        if let Some(progress) = progress {
            progress.finish();
        }

        let mut routed = FxHashMap::default();
        let mut fatal = None;
        let mut cancelled = false;
        for result in results {
            match result {
                Ok(Processed { asset, warning }) => {
                    if let Some(error) = warning {
                        diagnostics.push(Diagnostic::transform_failed(asset.kind, Severity::Warn, &error));
                    }
                    routed.insert(asset.output.module_id.clone(), asset);
                }
                Err(Fatal {
                    error: TransformError::Cancelled { .. },
                    ..
                }) => cancelled = true,
                Err(Fatal { kind, error }) => {
                    diagnostics.push(Diagnostic::transform_failed(kind, Severity::Fatal, &error));
                    fatal.get_or_insert(error);
                }
            }
        }

        if let Some(error) = fatal {
            return Err(error.into());
        }
        if cancelled {
            return Err(BuildError::Cancelled);
        }
        Ok(routed)
    }

    fn process_module(
        &self,
        runner: &TransformRunner<'_>,
        abort: &AtomicBool,
        module: &Module,
    ) -> Result<Processed, Fatal> {
        let pipeline = self.pipeline;
        let rule = pipeline.rules.match_module(module);
        let kind = rule.map_or(module.kind, |r| r.effective_kind(module.kind));
        let passthrough = TransformChain::empty();
        let chain = rule.map_or(&passthrough, |r| &r.chain);

        let fatal = |error| Fatal { kind, error };
        let (mut output, warning) = match runner.run(module, chain) {
            Ok(output) => (output, None),
            Err(error @ TransformError::Cancelled { .. }) => return Err(fatal(error)),
            Err(error) => match pipeline.failure.for_kind(kind) {
                Severity::Fatal => {
                    abort.store(true, Ordering::Relaxed);
                    return Err(fatal(error));
                }
                Severity::Warn => {
                    debug!("transform"; "keeping raw content of {}", module.id);
                    (runner.run(module, &passthrough).map_err(fatal)?, Some(error))
                }
            },
        };
        output.inline_eligible = kind.is_inlineable();
        debug!("transform"; "{} {} ({} bytes)", module.id, output.content_hash, output.size());

        Ok(Processed {
            asset: pipeline.router.route(output, kind, rule),
            warning,
        })
    }

    // ========================================================================
    // rendering
    // ========================================================================

    fn render(
        &self,
        pool: &ThreadPool,
        plan: &ChunkPlan,
        routed: &FxHashMap<ModuleId, RoutedAsset>,
    ) -> Result<Vec<Pending>, RenderError> {
        let public_path = &self.pipeline.public_path;
        let chunks: Vec<Vec<Pending>> = pool.install(|| {
            plan.chunks
                .par_iter()
                .enumerate()
                .map(|(index, chunk)| {
                    if chunk.is_runtime {
                        let runtime = plan
                            .entrypoints
                            .values()
                            .find(|entry| entry.runtime == chunk.name)
                            .map(|entry| render_runtime(entry, plan, public_path));
                        return Ok(runtime
                            .map(|bytes| Pending {
                                slot: Slot::Script { chunk: index },
                                label: format!("{}.js", chunk.name),
                                class: ArtifactClass::Script,
                                bytes,
                            })
                            .into_iter()
                            .collect());
                    }

                    let rendered = render_chunk(chunk, routed)?;
                    let mut out = vec![Pending {
                        slot: Slot::Script { chunk: index },
                        label: format!("{}.js", chunk.name),
                        class: ArtifactClass::Script,
                        bytes: rendered.script,
                    }];
                    if let Some(style) = rendered.style {
                        out.push(Pending {
                            slot: Slot::Style { chunk: index },
                            label: format!("{}.css", chunk.name),
                            class: ArtifactClass::Style,
                            bytes: style,
                        });
                    }
                    Ok(out)
                })
                .collect::<Result<_, RenderError>>()
        })?;

        let mut assets: Vec<_> = routed
            .iter()
            .filter_map(|(id, asset)| match asset.placement {
                Placement::Emit { dir } => Some((id, asset, dir)),
                _ => None,
            })
            .collect();
        assets.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let templates = &self.pipeline.templates;
        Ok(chunks
            .into_iter()
            .flatten()
            .chain(assets.into_iter().map(|(id, asset, dir)| Pending {
                slot: Slot::Asset {
                    id: id.clone(),
                    template: asset
                        .filename
                        .clone()
                        .unwrap_or_else(|| templates.asset(dir).clone()),
                },
                label: id.to_string(),
                class: ArtifactClass::of_path(id.path()),
                bytes: asset.output.buffer.clone(),
            }))
            .collect())
    }

    // ========================================================================
    // minimization
    // ========================================================================

    /// Run minimizers class by class (style → script → image).
    fn minimize(&self, pool: &ThreadPool, pending: &mut [Pending], diagnostics: &mut Diagnostics) -> Result<(), BuildError> {
        for class in ArtifactClass::MINIMIZE_ORDER {
            for minimizer in self.minimizers.iter().filter(|m| m.class() == class) {
                self.check_cancelled()?;
                let minimizer = minimizer.as_ref();
                let fallbacks: Vec<Option<Diagnostic>> = pool.install(|| {
                    pending
                        .par_iter_mut()
                        .map(|item| {
                            if item.class != class || !minimizer.accepts(&item.label) {
                                return None;
                            }
                            let input = std::mem::take(&mut item.bytes);
                            let (bytes, fallback) = minimize_or_keep(minimizer, &item.label, input);
                            item.bytes = bytes;
                            fallback.map(|reason| Diagnostic::MinimizerFallback {
                                artifact: item.label.clone(),
                                minimizer: minimizer.name(),
                                reason,
                            })
                        })
                        .collect()
                });
                diagnostics.extend(fallbacks.into_iter().flatten());
            }
        }
        Ok(())
    }

    // ========================================================================
    // naming
    // ========================================================================

    /// Name every pending buffer and move it into `artifacts`.
    fn name(
        &self,
        pending: Vec<Pending>,
        plan: &ChunkPlan,
        namer: &mut ArtifactNamer,
        artifacts: &mut ArtifactSet,
    ) -> Result<(BTreeMap<String, ChunkFiles>, BTreeMap<String, String>), NamingCollisionError> {
        let templates = &self.pipeline.templates;
        let mut chunk_files: BTreeMap<String, ChunkFiles> = BTreeMap::new();
        let mut asset_files = BTreeMap::new();

        for item in pending {
            match item.slot {
                Slot::Script { chunk } => {
                    let chunk = &plan.chunks[chunk];
                    let template = templates.script(chunk.is_entry || chunk.is_runtime);
                    let path = namer.assign(template, &chunk.name, ".js", "", &item.bytes)?;
                    chunk_files.entry(chunk.name.clone()).or_default().js = path.clone();
                    artifacts.insert(&path, item.bytes, ArtifactSource::Chunk(chunk.name.clone()));
                }
                Slot::Style { chunk } => {
                    let chunk = &plan.chunks[chunk];
                    let template = templates.style(chunk.is_entry);
                    let path = namer.assign(template, &chunk.name, ".css", "", &item.bytes)?;
                    chunk_files.entry(chunk.name.clone()).or_default().css = Some(path.clone());
                    artifacts.insert(&path, item.bytes, ArtifactSource::Chunk(chunk.name.clone()));
                }
                Slot::Asset { id, template } => {
                    let path = namer.assign(
                        &template,
                        id.file_stem(),
                        dotted_ext(id.path()),
                        id.query(),
                        &item.bytes,
                    )?;
                    asset_files.insert(id.to_string(), path.clone());
                    artifacts.insert(&path, item.bytes, ArtifactSource::Asset(id));
                }
            }
        }
        Ok((chunk_files, asset_files))
    }
}
