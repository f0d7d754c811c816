//! Config command - show, init, path.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use billdesk::config::{AppConfig, ConfigError};
use billdesk::error::AppError;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration (file plus environment)
    Show,

    /// Write a configuration file with the default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path
    Path,
}

pub fn run(args: ConfigArgs, config: &AppConfig, path: Option<PathBuf>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            print!("{}", config.to_toml().map_err(AppError::from)?);
            Ok(())
        }
        ConfigCommand::Init { force } => init(path, force),
        ConfigCommand::Path => {
            let path = resolve(path)?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn resolve(path: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    path.or_else(AppConfig::default_config_path)
        .ok_or_else(|| AppError::from(ConfigError::NoConfigPath).into())
}

fn init(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = resolve(path)?;

    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    let written = AppConfig::default()
        .save(Some(path))
        .map_err(AppError::from)?;
    println!("Created configuration file at {}", written.display());
    Ok(())
}
