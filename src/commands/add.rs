//! # Add Command Implementation
//!
//! Registers repositories as `New` sources. GitHub shorthand (`org/repo`) is
//! expanded to a full HTTPS URL before registering.

use anyhow::Result;
use clap::Args;

use super::Context;

/// Track one or more repositories
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Repository URLs (e.g., https://github.com/org/repo or org/repo)
    #[arg(value_name = "URL", required = true)]
    pub urls: Vec<String>,
}

/// Execute the `add` command.
///
/// URLs are added one at a time, so a duplicate stops the command after the
/// URLs before it were registered.
pub fn execute(args: AddArgs, ctx: &Context) -> Result<()> {
    let mut pipeline = ctx.open()?;

    for input in &args.urls {
        let url = normalize_repo_url(input);
        let source = pipeline
            .add(&url)
            .map_err(|e| ctx.explain(e, pipeline.registry()))?;
        println!("Added {}: {}", source.id, source.url);
    }
    Ok(())
}

/// Expand GitHub shorthand; anything that already looks like a URL or a
/// local path is kept as-is.
fn normalize_repo_url(input: &str) -> String {
    let input = input.trim();
    let looks_like_url = input.contains("://") || input.starts_with("git@");
    let looks_like_path = input.starts_with('/') || input.starts_with('.') || input.starts_with('~');

    if !looks_like_url
        && !looks_like_path
        && !input.contains(':')
        && input.matches('/').count() == 1
    {
        return format!("https://github.com/{}", input);
    }
    input.to_string()
}
