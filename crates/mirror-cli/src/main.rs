//! tree-mirror CLI
//!
//! Diff two files, or mirror a project directory into a host directory.

mod cli;
mod commands;
mod error;
mod logging;
mod prompt;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: could not initialize logging: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd).await,
        None => {
            println!("{} tree-mirror CLI", "mirror".green().bold());
            println!();
            println!("Run {} for available commands.", "mirror --help".cyan());
            Ok(())
        }
    }
}

async fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Diff {
            before,
            after,
            json,
        } => commands::run_diff(&before, &after, json),
        Commands::Sync {
            project,
            host,
            name,
            policy,
            excludes,
            settings,
            state,
            reset,
            json,
        } => {
            let options = commands::SyncOptions {
                name,
                policy,
                excludes,
                settings,
                state,
                reset,
                json,
            };
            commands::run_sync(&project, &host, options).await
        }
    }
}
