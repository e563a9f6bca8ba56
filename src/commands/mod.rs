//! # CLI Command Implementations
//!
//! One module per subcommand. Each defines a `clap` `Args` struct and an
//! `execute` function that opens the workspace through [`Context`], calls
//! into [`sourcepipe::pipeline::Pipeline`] and prints the result.
//!
//! Library errors are passed through [`suggestions::explain`] so the user
//! gets hints along with the failure.

use std::path::PathBuf;

use anyhow::Result;

use sourcepipe::error::Error;
use sourcepipe::output::{render_report, OutputConfig};
use sourcepipe::phases::RunReport;
use sourcepipe::pipeline::Pipeline;
use sourcepipe::plugin::PluginRegistry;
use sourcepipe::source::SourceDef;
use sourcepipe::suggestions;

pub mod add;
pub mod completions;
pub mod init;
pub mod ls;
pub mod option;
pub mod plugin;
pub mod remove;
pub mod run;
pub mod show;

/// Settings shared by every command.
#[derive(Debug)]
pub struct Context {
    pub root: PathBuf,
    pub output: OutputConfig,
}

impl Context {
    /// Open the workspace at the configured root.
    pub fn open(&self) -> Result<Pipeline> {
        Pipeline::open(&self.root).map_err(|e| self.explain(e, &PluginRegistry::with_builtins()))
    }

    pub fn explain(&self, error: Error, registry: &PluginRegistry) -> anyhow::Error {
        suggestions::explain(error, &self.root, registry)
    }
}

/// Parse positional source arguments.
pub fn source_defs(args: &[String]) -> Vec<SourceDef> {
    args.iter().map(|arg| SourceDef::parse(arg)).collect()
}

/// Print a report and fail if any source failed or did not resolve.
pub fn finish(ctx: &Context, report: &RunReport) -> Result<()> {
    print!("{}", render_report(&ctx.output, report));
    if report.is_success() {
        Ok(())
    } else {
        Err(suggestions::run_failed(
            &report.operation.to_string(),
            report.failed().count(),
            report.missing.len(),
        ))
    }
}
