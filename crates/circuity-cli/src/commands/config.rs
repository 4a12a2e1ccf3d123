//! Config command for managing CLI configuration

use clap::{Args, Subcommand};

use crate::config::Config;
use crate::Cli;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Get a config value
    Get {
        /// Config key name
        key: String,
    },
    /// Set a config value (an empty value unsets it)
    Set {
        /// Config key name
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
    /// Initialize default config file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: &ConfigArgs, cli: &Cli) -> anyhow::Result<()> {
    let path = cli.config_path();

    match &args.command {
        ConfigCommands::Get { key } => {
            let config = Config::load(&path)?;
            match config.get(key) {
                Some(value) => println!("{}", value),
                None => anyhow::bail!(
                    "Unknown config key: {}. Available keys: {}",
                    key,
                    Config::keys().join(", ")
                ),
            }
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(&path)?;
            config.set(key, value)?;
            config.save(&path)?;
            println!("Set {} = {}", key, value);
        }
        ConfigCommands::List => {
            let config = Config::load(&path)?;
            println!("Config file: {}", path.display());
            println!();
            for key in Config::keys() {
                let value = config
                    .get(key)
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| "(not set)".to_string());
                println!("{} = {}", key, value);
            }
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Config::default().save(&path)?;
            println!("Created config file at {}", path.display());
        }
    }

    Ok(())
}
