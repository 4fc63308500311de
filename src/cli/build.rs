//! `bale build`.
//!
//! Phases:
//! - **Config** - load `bale.toml`, apply CLI overrides, compile the pipeline
//! - **Graph** - read the module manifest produced by the resolver
//! - **Build** - orchestrate transforms, chunking, minimization and naming
//! - **Write** - hand the artifact set to the output directory

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::{Context, Result};

use super::BuildArgs;
use crate::build::{BuildOutput, Orchestrator};
use crate::config::{BaleConfig, Pipeline};
use crate::graph::ManifestSupplier;
use crate::log;
use crate::transform::TransformRegistry;
use crate::utils::plural::plural_count;

/// Load and compile the configuration, printing its warnings.
pub fn load_pipeline(config_name: &Path, args: &BuildArgs) -> Result<(BaleConfig, Pipeline)> {
    let mut config = BaleConfig::discover(config_name)?;
    config.apply_build_args(args);
    let pipeline = config.compile(&TransformRegistry::with_builtins())?;
    pipeline.warnings.print_warnings();
    Ok((config, pipeline))
}

/// Graph supplier reading `[graph] manifest` relative to the project root.
pub fn graph_supplier(config: &BaleConfig) -> ManifestSupplier {
    ManifestSupplier::new(
        config.root_join(&config.graph.manifest),
        config.root_join(&config.graph.root),
    )
}

pub fn build(config_name: &Path, args: &BuildArgs, cancel: Arc<AtomicBool>) -> Result<()> {
    let started = Instant::now();
    let (config, pipeline) = load_pipeline(config_name, args)?;
    log!("build"; "{} build of {}", config.mode.as_str(), plural_count(pipeline.entries.len(), "entry point"));

    let output = Orchestrator::new(&pipeline)
        .with_cancel(cancel)
        .with_progress(true)
        .run(&graph_supplier(&config));

    let output = match output {
        Ok(output) => output,
        Err(failure) => {
            failure.diagnostics.print();
            return Err(failure.into());
        }
    };
    output.diagnostics.print();

    let dir = config.output_dir();
    output
        .artifacts
        .write_to(&dir, config.output.clean)
        .with_context(|| format!("failed to write output to `{}`", dir.display()))?;

    log_summary(&output, started);
    Ok(())
}

fn log_summary(output: &BuildOutput, started: Instant) {
    let chunks = output.plan.chunks.len();
    let bytes = output.artifacts.total_bytes();
    log!(
        "build";
        "{}, {} ({} KiB) in {:.2?}",
        plural_count(chunks, "chunk"),
        plural_count(output.artifacts.len(), "file"),
        bytes.div_ceil(1024),
        started.elapsed()
    );
}
