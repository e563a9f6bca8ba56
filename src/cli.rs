//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use sourcepipe::defaults::{default_root, ROOT_ENV_VAR};
use sourcepipe::output::OutputConfig;

use crate::commands::{self, Context};

/// Track a set of git repositories and drive them through clone, analyze and join
#[derive(Parser, Debug)]
#[command(name = "sourcepipe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Workspace directory (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR", env = ROOT_ENV_VAR)]
    root: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a workspace in the root directory
    Init(commands::init::InitArgs),

    /// Track one or more repositories
    Add(commands::add::AddArgs),

    /// Stop tracking a repository
    Remove(commands::remove::RemoveArgs),

    /// List tracked repositories
    Ls(commands::ls::LsArgs),

    /// Show the full record of one repository
    Show(commands::show::ShowArgs),

    /// Enable, disable and list plugins
    Plugin(commands::plugin::PluginArgs),

    /// Set and unset plugin options
    Option(commands::option::OptionArgs),

    /// Clone new repositories
    Clone(commands::run::SourceArgs),

    /// Run the enabled analyses on cloned repositories
    Analyze(commands::run::SourceArgs),

    /// Run the enabled joins over all finished repositories
    Join,

    /// Undo analyses on finished repositories
    Clean(commands::run::CleanArgs),

    /// Clone, analyze and join in one pass
    Run(commands::run::SourceArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let ctx = Context {
            root: self.root.unwrap_or_else(default_root),
            output: OutputConfig::from_env_and_flag(&self.color),
        };

        match self.command {
            Commands::Init(args) => commands::init::execute(args, &ctx),
            Commands::Add(args) => commands::add::execute(args, &ctx),
            Commands::Remove(args) => commands::remove::execute(args, &ctx),
            Commands::Ls(args) => commands::ls::execute(args, &ctx),
            Commands::Show(args) => commands::show::execute(args, &ctx),
            Commands::Plugin(args) => commands::plugin::execute(args, &ctx),
            Commands::Option(args) => commands::option::execute(args, &ctx),
            Commands::Clone(args) => commands::run::clone(args, &ctx),
            Commands::Analyze(args) => commands::run::analyze(args, &ctx),
            Commands::Join => commands::run::join(&ctx),
            Commands::Clean(args) => commands::run::clean(args, &ctx),
            Commands::Run(args) => commands::run::all(args, &ctx),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Route `log` records to stderr, filtered by `RUST_LOG` or else `level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
