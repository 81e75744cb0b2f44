//! CLI module for Agentpad
//!
//! - `serve`: run the HTTP server (default)
//! - `doctor`: validate configuration and check backend connectivity

use clap::{Parser, Subcommand};

pub mod doctor;

/// Agentpad CLI
#[derive(Parser, Debug)]
#[command(name = "agentpad")]
#[command(about = "Ephemeral scratchpads and todo lists for agents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve,
    /// Check configuration and storage backend
    Doctor,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Doctor) => doctor::run().await,
        Some(Commands::Serve) | None => crate::server::run().await,
    }
}
