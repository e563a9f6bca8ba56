//! # Option Command Implementation
//!
//! Values are parsed as YAML, so `option set ignore '["*.lock"]'` stores a
//! list and `option set depth 3` stores a number.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};

use super::Context;

/// Set and unset plugin options
#[derive(Args, Debug)]
pub struct OptionArgs {
    #[command(subcommand)]
    pub command: OptionCommand,
}

#[derive(Subcommand, Debug)]
pub enum OptionCommand {
    /// Set an option to a YAML value
    Set { name: String, value: String },
    /// Remove an option
    Unset { name: String },
    /// Print all options
    List,
}

/// Execute the `option` command.
pub fn execute(args: OptionArgs, ctx: &Context) -> Result<()> {
    let mut pipeline = ctx.open()?;

    match args.command {
        OptionCommand::Set { name, value } => {
            let parsed: serde_yaml::Value = serde_yaml::from_str(&value)
                .with_context(|| format!("Invalid value for option '{}': {}", name, value))?;
            pipeline
                .set_option(&name, parsed)
                .map_err(|e| ctx.explain(e, pipeline.registry()))?;
            println!("Set {}", name);
        }
        OptionCommand::Unset { name } => {
            match pipeline
                .unset_option(&name)
                .map_err(|e| ctx.explain(e, pipeline.registry()))?
            {
                Some(_) => println!("Unset {}", name),
                None => println!("Option '{}' was not set", name),
            }
        }
        OptionCommand::List => {
            let options = &pipeline.config().options;
            if options.is_empty() {
                println!("No options set");
            } else {
                print!("{}", serde_yaml::to_string(options)?);
            }
        }
    }
    Ok(())
}
