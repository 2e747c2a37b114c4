//! Command handlers for all CLI operations
//!
//! `CommandHandler` owns the context and builds a focused handler per
//! command group.

pub mod traits;
pub mod config;
pub mod worker;
pub mod otp;

use super::{CliContext, Commands};
use anyhow::Result;
use tracing::debug;

use self::config::ConfigHandler;
use self::otp::OtpHandler;
use self::traits::HandlerBuilder;
use self::worker::WorkerHandler;

/// Coordinates all command handling operations with dependency injection via CliContext
pub struct CommandHandler {
    context: CliContext,
}

impl CommandHandler {
    pub fn new(context: CliContext) -> Self {
        Self { context }
    }

    /// Route commands to their appropriate handlers
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        let builder = HandlerBuilder::new(&self.context);

        match command {
            Commands::Init { global, force } => {
                builder.create::<ConfigHandler>().handle_init(global, force).await
            }
            Commands::Config { action } => builder.create::<ConfigHandler>().handle_config(action).await,
            Commands::Push { payload } => {
                debug!("Delivering push event");
                builder.create::<WorkerHandler>().handle_push(payload).await
            }
            Commands::Simulate {
                payload,
                open,
                no_open_window,
                action,
            } => {
                builder
                    .create::<WorkerHandler>()
                    .handle_simulate(payload, open, no_open_window, action)
                    .await
            }
            Commands::Sync { tag } => builder.create::<WorkerHandler>().handle_sync(tag).await,
            Commands::Otp { action } => builder.create::<OtpHandler>().handle_otp(action).await,
        }
    }
}
