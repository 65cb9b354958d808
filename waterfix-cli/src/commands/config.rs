//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use clap::Subcommand;
use waterfix::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration
    Show,

    /// Write a default configuration file if none exists
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init => run_init(),
    }
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

/// Print the configuration in effect, defaults filled in.
fn run_show() -> Result<(), CliError> {
    let path = config_file_path();
    let config = ConfigFile::load_from(&path)?;

    if !path.exists() {
        println!("# {} not found, showing defaults", path.display());
        println!();
    }
    print!("{}", render(&config)?);
    Ok(())
}

/// Create the config file with defaults.
fn run_init() -> Result<(), CliError> {
    let path = config_file_path();
    if path.exists() {
        println!("Configuration file already exists: {}", path.display());
        return Ok(());
    }

    let path = ConfigFile::default().save()?;
    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to customize WaterFix settings.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}

fn render(config: &ConfigFile) -> Result<String, CliError> {
    let mut buffer = Vec::new();
    config
        .to_ini()
        .write_to(&mut buffer)
        .map_err(|e| CliError::Config(format!("Failed to render configuration: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| CliError::Config(format!("Failed to render configuration: {}", e)))
}
