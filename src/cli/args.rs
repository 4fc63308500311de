//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Bale asset build pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the current directory
    #[arg(short = 'C', long, global = true, default_value = "bale.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build every entry into the output directory
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Print the chunk plan without transforming or writing anything
    #[command(visible_alias = "p")]
    Plan {
        /// Use development mode
        #[arg(short, long)]
        dev: bool,

        /// Print the plan as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Build command arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Development build: readable output, stable filenames
    #[arg(short, long)]
    pub dev: bool,

    /// Run minimizers (defaults to on in production)
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Worker threads (0 for available parallelism)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Remove files of earlier builds from the output directory
    #[arg(short, long)]
    pub clean: bool,

    /// Output directory path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}
