use anyhow::{Context, Result};
use clap::Subcommand;
use pypip_config::ConfigManager;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show config file path
    Path,

    /// Print the effective settings (file, environment and defaults)
    Show,

    /// Write a config file with default settings
    Init,
}

pub fn handle_config_command(cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Path => show_config_path(),
        ConfigCommand::Show => show_config(),
        ConfigCommand::Init => init_config(),
    }
}

fn show_config_path() -> Result<()> {
    let config_path = ConfigManager::config_path()?;
    println!("{}", config_path.display());
    Ok(())
}

fn show_config() -> Result<()> {
    let manager = ConfigManager::load().context("Config is invalid. Fix it or run 'pypip config init'")?;

    if !manager.path().exists() {
        println!("# {} does not exist, showing defaults", manager.path().display());
    }
    print!("{}", manager.to_toml()?);
    Ok(())
}

fn init_config() -> Result<()> {
    let config_path = ConfigManager::config_path()?;

    if config_path.exists() {
        println!("Config already exists at: {}", config_path.display());
        println!("To reinitialize, please delete the existing config first.");
        return Ok(());
    }

    ConfigManager::init().with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("✓ Initialized config at: {}", config_path.display());
    Ok(())
}
