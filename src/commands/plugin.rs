//! # Plugin Command Implementation
//!
//! `plugin add|remove <kind> <id>` edits the enabled lists in the workspace
//! configuration; `plugin list` shows them, or every registered plugin with
//! `--available`.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

use sourcepipe::plugin::PluginKind;

use super::Context;

/// Enable, disable and list plugins
#[derive(Args, Debug)]
pub struct PluginArgs {
    #[command(subcommand)]
    pub command: PluginCommand,
}

#[derive(Subcommand, Debug)]
pub enum PluginCommand {
    /// Enable a plugin (appended to the end of the run order)
    Add {
        #[arg(value_enum)]
        kind: KindArg,
        id: String,
    },
    /// Disable a plugin
    Remove {
        #[arg(value_enum)]
        kind: KindArg,
        id: String,
    },
    /// List enabled plugins in run order
    List {
        /// Only list this kind
        #[arg(value_enum)]
        kind: Option<KindArg>,

        /// List every registered plugin instead
        #[arg(long)]
        available: bool,
    },
}

/// Plugin capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    #[value(alias = "addons")]
    Addon,
    #[value(alias = "analyses")]
    Analysis,
    #[value(alias = "joins")]
    Join,
}

impl From<KindArg> for PluginKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Addon => PluginKind::Addon,
            KindArg::Analysis => PluginKind::Analysis,
            KindArg::Join => PluginKind::Join,
        }
    }
}

/// Execute the `plugin` command.
pub fn execute(args: PluginArgs, ctx: &Context) -> Result<()> {
    let mut pipeline = ctx.open()?;

    match args.command {
        PluginCommand::Add { kind, id } => {
            let kind = PluginKind::from(kind);
            pipeline
                .add_plugin(kind, &id)
                .map_err(|e| ctx.explain(e, pipeline.registry()))?;
            println!("Enabled {} '{}'", kind, id);
        }
        PluginCommand::Remove { kind, id } => {
            let kind = PluginKind::from(kind);
            pipeline
                .remove_plugin(kind, &id)
                .map_err(|e| ctx.explain(e, pipeline.registry()))?;
            println!("Disabled {} '{}'", kind, id);
        }
        PluginCommand::List { kind, available } => {
            let kinds: Vec<PluginKind> = match kind {
                Some(kind) => vec![kind.into()],
                None => PluginKind::ALL.to_vec(),
            };

            if available {
                for (id, plugin_kind) in pipeline.available_plugins() {
                    if kinds.contains(&plugin_kind) {
                        println!("{:<9} {}", plugin_kind, id);
                    }
                }
            } else {
                for kind in kinds {
                    for id in pipeline.list_plugins(kind) {
                        println!("{:<9} {}", kind, id);
                    }
                }
            }
        }
    }
    Ok(())
}
