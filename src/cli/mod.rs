//! CLI module providing command-line interface functionality
//!
//! This module handles argument parsing and routes commands to handlers that
//! drive the worker against a simulated host or call the collaborator clients.

pub mod commands;
pub mod handlers;
pub mod context;

use anyhow::Result;
use clap::Parser;

pub use commands::{Cli, Commands, ConfigAction, OtpAction};
pub use handlers::CommandHandler;
pub use context::CliContext;

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Parse command line arguments and execute the requested command
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();

        let context = CliContext::new(cli.project.clone(), cli.verbose)?;

        // Keep the guard alive so buffered file logs are flushed on exit
        let _log_guard = context.init_logging()?;

        let handler = CommandHandler::new(context);
        handler.handle_command(cli.command).await
    }
}
