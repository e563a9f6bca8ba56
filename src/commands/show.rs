//! # Show Command Implementation
//!
//! Prints the full record of one source as YAML, the same shape it has in
//! the source log.

use anyhow::Result;
use clap::Args;

use sourcepipe::source::SourceDef;

use super::Context;

/// Show the full record of one repository
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Source id or URL
    #[arg(value_name = "SOURCE")]
    pub source: String,
}

/// Execute the `show` command.
pub fn execute(args: ShowArgs, ctx: &Context) -> Result<()> {
    let pipeline = ctx.open()?;
    let source = pipeline
        .get(&SourceDef::parse(&args.source))
        .map_err(|e| ctx.explain(e, pipeline.registry()))?;

    print!("{}", serde_yaml::to_string(&source)?);
    println!(
        "path: {}",
        pipeline.workspace().resolve(&source.folder).display()
    );
    Ok(())
}
