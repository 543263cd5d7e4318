//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod migrate;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "pepm")]
#[command(about = "Migrates CELESC PEP pole-sharing forms from the legacy portal to the new one")]
#[command(version)]
pub struct Cli {
    /// Persisted config file (default: the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate one protocol from the legacy form to the new one
    Migrate {
        /// Protocol number of the legacy form
        protocol: String,

        /// Folder whose files go to the Anexos tab (optional)
        folder: Option<String>,
    },

    /// Start the web control panel for batch migrations
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT
        #[arg(default_value = "127.0.0.1:5000")]
        bind: String,
    },

    /// Check the environment: Chrome, credentials, base directory
    Check,
}

pub async fn run() -> anyhow::Result<()> {
    // Usage problems exit 1, matching the scripts this replaced.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let settings = Settings::from_env();
    let config_path = cli.config;

    match cli.command {
        Commands::Migrate { protocol, folder } => {
            migrate::cmd_migrate(&settings, &protocol, folder.as_deref()).await
        }
        Commands::Serve { bind } => serve::cmd_serve(settings, &bind, config_path).await,
        Commands::Check => check::cmd_check(&settings, config_path).await,
    }
}
