//! # Ls Command Implementation
//!
//! Lists tracked sources with their state and recorded fault, optionally
//! filtered by state and by error presence. Read-only.

use anyhow::Result;
use clap::{Args, ValueEnum};

use sourcepipe::output::render_source;
use sourcepipe::source::{SourceFilter, SourceState};

use super::{source_defs, Context};

/// List tracked repositories
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Only show these sources (ids or URLs)
    #[arg(value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Only show sources in this state
    #[arg(short, long, value_enum)]
    pub state: Option<StateArg>,

    /// Only show sources with a recorded fault
    #[arg(long, conflicts_with = "ok")]
    pub errors: bool,

    /// Only show sources without a recorded fault
    #[arg(long)]
    pub ok: bool,

    /// Show only the number of matching sources
    #[arg(long)]
    pub count: bool,
}

/// Lifecycle state filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    New,
    Cloned,
    Finished,
}

impl From<StateArg> for SourceState {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::New => SourceState::New,
            StateArg::Cloned => SourceState::Cloned,
            StateArg::Finished => SourceState::Finished,
        }
    }
}

impl LsArgs {
    fn filter(&self) -> SourceFilter {
        let mut filter = SourceFilter::any();
        filter.state = self.state.map(SourceState::from);
        if self.errors {
            filter = filter.with_error(true);
        } else if self.ok {
            filter = filter.with_error(false);
        }
        filter
    }
}

/// Execute the `ls` command.
pub fn execute(args: LsArgs, ctx: &Context) -> Result<()> {
    let pipeline = ctx.open()?;
    let selection = pipeline.select(&source_defs(&args.sources), args.filter());
    for error in selection.errors() {
        eprintln!("warning: {}", error);
    }

    if args.count {
        println!("{}", selection.sources.len());
        return Ok(());
    }
    if selection.sources.is_empty() {
        println!("No sources");
        return Ok(());
    }
    for source in &selection.sources {
        println!("{}", render_source(&ctx.output, source));
    }
    Ok(())
}
