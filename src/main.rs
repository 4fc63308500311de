//! Bale - an asset build pipeline core.

mod asset;
mod build;
mod chunk;
mod cli;
mod config;
mod embed;
mod graph;
mod logger;
mod minify;
mod naming;
mod rule;
mod transform;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match &cli.command {
        Commands::Build { args } => {
            let cancel = cli::setup_cancel_handler()?;
            cli::build::build(&cli.config, args, cancel)
        }
        Commands::Plan { dev, json } => cli::plan::plan(&cli.config, *dev, *json),
    }
}
