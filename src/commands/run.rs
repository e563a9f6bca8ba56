//! # Pipeline Operation Commands
//!
//! `clone`, `analyze`, `join`, `clean` and `run`. Each prints one line per
//! processed source and exits non-zero if any of them failed.

use anyhow::Result;
use clap::Args;

use super::{finish, source_defs, Context};

/// Source selection shared by the per-source operations
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Sources to process (ids or URLs); all eligible sources if omitted
    #[arg(value_name = "SOURCE")]
    pub sources: Vec<String>,
}

/// Arguments for `clean`
#[derive(Args, Debug)]
pub struct CleanArgs {
    #[command(flatten)]
    pub selection: SourceArgs,

    /// Run the join clean hooks instead of the analysis ones
    #[arg(long, conflicts_with = "sources")]
    pub joins: bool,
}

pub fn clone(args: SourceArgs, ctx: &Context) -> Result<()> {
    let mut pipeline = ctx.open()?;
    let report = pipeline
        .run_clone(&source_defs(&args.sources))
        .map_err(|e| ctx.explain(e, pipeline.registry()))?;
    finish(ctx, &report)
}

pub fn analyze(args: SourceArgs, ctx: &Context) -> Result<()> {
    let mut pipeline = ctx.open()?;
    let report = pipeline
        .run_analyze(&source_defs(&args.sources))
        .map_err(|e| ctx.explain(e, pipeline.registry()))?;
    finish(ctx, &report)
}

pub fn join(ctx: &Context) -> Result<()> {
    let mut pipeline = ctx.open()?;
    let report = pipeline
        .run_join()
        .map_err(|e| ctx.explain(e, pipeline.registry()))?;
    finish(ctx, &report)
}

pub fn clean(args: CleanArgs, ctx: &Context) -> Result<()> {
    let mut pipeline = ctx.open()?;
    let result = if args.joins {
        pipeline.run_join_clean()
    } else {
        pipeline.run_clean(&source_defs(&args.selection.sources))
    };
    let report = result.map_err(|e| ctx.explain(e, pipeline.registry()))?;
    finish(ctx, &report)
}

/// Clone, analyze and join. Every report is printed; the first failing one
/// decides the error.
pub fn all(args: SourceArgs, ctx: &Context) -> Result<()> {
    let mut pipeline = ctx.open()?;
    let reports = pipeline
        .run_all(&source_defs(&args.sources))
        .map_err(|e| ctx.explain(e, pipeline.registry()))?;

    let mut first_failure = None;
    for report in &reports {
        if let Err(e) = finish(ctx, report) {
            first_failure.get_or_insert(e);
        }
    }
    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
