//! WaterFix CLI - Command-line interface
//!
//! Reads a load order and plugin dumps, reconciles cell water against the
//! authority plugins and writes the output plugin.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing::info;
use waterfix::config::ConfigFile;
use waterfix::logging::init_logging;

use commands::config::ConfigCommands;
use commands::run::{RunArgs, RunMode};
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "waterfix")]
#[command(version, about = "Restore authoritative cell water in Skyrim load orders")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Reconcile the load order and write the output plugin
    Run(RunArgs),

    /// Reconcile the load order and report without writing anything
    Check(RunArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Run(args) => reconcile(&args, cli.verbose, RunMode::Write),
        Commands::Check(args) => reconcile(&args, cli.verbose, RunMode::DryRun),
        // Config commands must work even when the file is broken.
        Commands::Config { command } => commands::config::run(command),
    }
}

fn reconcile(args: &RunArgs, verbose: bool, mode: RunMode) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let guard = init_logging(&config.logging, verbose)?;
    if let Some(directory) = guard.log_directory() {
        info!(directory = %directory.display(), "Writing log files");
    }
    commands::run::run(args, &config, mode)
}
