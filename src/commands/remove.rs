//! # Remove Command Implementation

use anyhow::Result;
use clap::Args;

use sourcepipe::source::SourceDef;

use super::Context;

/// Stop tracking a repository
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Source id or URL
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Also delete the working tree and result files
    #[arg(long)]
    pub purge: bool,
}

/// Execute the `remove` command.
pub fn execute(args: RemoveArgs, ctx: &Context) -> Result<()> {
    let mut pipeline = ctx.open()?;
    let source = pipeline
        .remove(&SourceDef::parse(&args.source), args.purge)
        .map_err(|e| ctx.explain(e, pipeline.registry()))?;

    println!("Removed {}: {}", source.id, source.url);
    if !args.purge {
        println!(
            "Working tree kept at {}",
            pipeline.workspace().resolve(&source.folder).display()
        );
    }
    Ok(())
}
