//! # sourcepipe CLI
//!
//! Binary entry point. Parses arguments with `clap`, sets up logging, and
//! dispatches to the command modules, which are thin wrappers around
//! [`sourcepipe::pipeline::Pipeline`].
//!
//! The process exits non-zero when a command fails, including when a
//! pipeline operation leaves any selected source with a recorded fault.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
