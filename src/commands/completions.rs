//! # Completions Command Implementation
//!
//! Writes a `clap_complete` completion script for the chosen shell to stdout.
//!
//! ```bash
//! sourcepipe completions bash > ~/.local/share/bash-completion/completions/sourcepipe
//! sourcepipe completions zsh > ~/.zfunc/_sourcepipe
//! ```

use std::io;

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
