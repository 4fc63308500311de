//! `bale plan`: chunk partitioning without transforms or output.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use super::BuildArgs;
use super::build::{graph_supplier, load_pipeline};
use crate::chunk::{ChunkPlan, ChunkPlanner};
use crate::graph::GraphSupplier;
use crate::log;

pub fn plan(config_name: &Path, dev: bool, json: bool) -> Result<()> {
    let args = BuildArgs {
        dev,
        ..BuildArgs::default()
    };
    let (config, pipeline) = load_pipeline(config_name, &args)?;
    let graph = graph_supplier(&config).supply()?;
    graph.validate_entries(&pipeline.entries)?;
    let plan = ChunkPlanner::new(&pipeline.cache_groups)
        .with_tie_break(pipeline.tie_break)
        .plan(&graph, &pipeline.entries)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn print_plan(plan: &ChunkPlan) {
    for (name, entry) in &plan.entrypoints {
        println!(
            "{} {} → {} + {}",
            "entry".green().bold(),
            name,
            entry.runtime.dimmed(),
            entry.initial_chunks.join(", ")
        );
    }
    for (root, chunks) in &plan.async_chunks {
        println!("{} {} → {}", "async".cyan().bold(), root, chunks.join(", "));
    }
    println!();

    for chunk in plan.chunks.iter().filter(|c| !c.is_runtime) {
        let tag = if chunk.initial { "initial" } else { "async" };
        println!("{} {}", chunk.name.bold(), format!("({tag})").dimmed());
        for module in &chunk.modules {
            println!("  {module}");
        }
    }

    if !plan.orphans.is_empty() {
        log!("warning"; "{} unreachable:", crate::utils::plural::plural_count(plan.orphans.len(), "module"));
        for module in &plan.orphans {
            eprintln!("- {module}");
        }
    }
}
