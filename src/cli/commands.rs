//! Command definitions and structures for the CLI
//!
//! This module contains all the clap-based command line argument definitions,
//! including the main CLI structure and all subcommands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "quick-clinic-push")]
#[command(about = "Quick Clinic push-notification worker")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project path for project-level configuration
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize configuration
    Init {
        /// Initialize global configuration (default is project-level)
        #[arg(short, long)]
        global: bool,

        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Deliver a push payload to the worker and show the resulting notification
    Push {
        /// JSON payload; read from stdin when omitted (empty stdin means no payload)
        #[arg(short, long)]
        payload: Option<String>,
    },

    /// Deliver a push payload, then click the shown notification
    Simulate {
        /// JSON payload; read from stdin when omitted
        #[arg(short, long)]
        payload: Option<String>,

        /// URL of an already open window (repeatable, in enumeration order)
        #[arg(long = "open", value_name = "URL")]
        open: Vec<String>,

        /// Simulate a host that cannot open new windows
        #[arg(long)]
        no_open_window: bool,

        /// Action button to click instead of the notification body
        #[arg(short, long)]
        action: Option<String>,
    },

    /// Fire the background sync trigger against the configured notification store
    Sync {
        /// Sync tag to fire
        #[arg(short, long, default_value = "sync-notifications")]
        tag: String,
    },

    /// Phone verification through the OTP provider
    Otp {
        #[command(subcommand)]
        action: OtpAction,
    },
}

/// Configuration management actions
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Configuration key (e.g., store.base_url)
        key: String,
        /// Value to set; empty clears optional values
        value: String,
    },

    /// Get configuration value
    Get {
        /// Configuration key
        key: String,
    },
}

/// OTP actions
#[derive(Subcommand)]
pub enum OtpAction {
    /// Send a one-time code to a phone number
    Send {
        phone: String,
    },

    /// Verify a one-time code
    Verify {
        phone: String,
        code: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_collects_open_windows_in_order() {
        let cli = Cli::try_parse_from([
            "quick-clinic-push",
            "simulate",
            "--open",
            "/a",
            "--open",
            "/b",
            "--no-open-window",
        ])
        .unwrap();

        match cli.command {
            Commands::Simulate { open, no_open_window, payload, .. } => {
                assert_eq!(open, vec!["/a".to_string(), "/b".to_string()]);
                assert!(no_open_window);
                assert!(payload.is_none());
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_sync_default_tag() {
        let cli = Cli::try_parse_from(["quick-clinic-push", "sync"]).unwrap();
        match cli.command {
            Commands::Sync { tag } => assert_eq!(tag, "sync-notifications"),
            _ => panic!("expected sync"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["quick-clinic-push", "otp", "send", "5551234567", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
