use anyhow::Context;
use clap::Subcommand;

use crate::config::{CONFIG_TOML, Config};
use crate::error::ExitError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a commented .chat-bubbles.toml with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

impl ConfigCommand {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        match self {
            ConfigCommand::Init { force } => init(*force),
            ConfigCommand::Show => {
                print!("{}", config.to_toml()?);
                Ok(())
            }
        }
    }
}

pub fn init(force: bool) -> anyhow::Result<()> {
    let path = std::env::current_dir()
        .context("could not determine current directory")?
        .join(CONFIG_TOML);
    if path.exists() && !force {
        return Err(ExitError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ))
        .into());
    }
    std::fs::write(&path, Config::default().to_toml()?)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}
