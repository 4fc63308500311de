//! Command-line interface module.

mod args;
pub mod build;
pub mod plan;
mod signal;

pub use args::{BuildArgs, Cli, Commands};
pub use signal::setup_cancel_handler;
