//! # Init Command Implementation
//!
//! Creates the marker, source list, source log and configuration file in the
//! workspace root. Fails if the root already holds a workspace.

use anyhow::Result;
use clap::Args;

use sourcepipe::builtin::{commit_count, file_stats, summary};
use sourcepipe::pipeline::Pipeline;
use sourcepipe::plugin::{PluginKind, PluginRegistry};

use super::Context;

/// Create a workspace
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Enable the built-in file-stats, commit-count and summary plugins
    #[arg(long)]
    pub with_defaults: bool,
}

/// Execute the `init` command.
pub fn execute(args: InitArgs, ctx: &Context) -> Result<()> {
    let mut pipeline = Pipeline::init(&ctx.root)
        .map_err(|e| ctx.explain(e, &PluginRegistry::with_builtins()))?;

    if args.with_defaults {
        for (kind, id) in [
            (PluginKind::Analysis, file_stats::ID),
            (PluginKind::Analysis, commit_count::ID),
            (PluginKind::Join, summary::ID),
        ] {
            pipeline
                .add_plugin(kind, id)
                .map_err(|e| ctx.explain(e, pipeline.registry()))?;
        }
    }

    println!(
        "Initialized sourcepipe workspace in {}",
        pipeline.workspace().root().display()
    );
    println!("Next: sourcepipe add <url>");
    Ok(())
}
