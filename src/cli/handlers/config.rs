//! Configuration management handler
//!
//! Handles `init` and the `config show|get|set` subcommands.

use super::super::{CliContext, ConfigAction};
use crate::config::ConfigManager;
use anyhow::Result;
use std::path::PathBuf;

/// Handler for configuration operations
pub struct ConfigHandler<'a> {
    context: &'a CliContext,
}

impl<'a> ConfigHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    /// Write a default configuration file, keeping an existing one unless forced
    pub async fn handle_init(&self, global: bool, force: bool) -> Result<()> {
        let path = if global {
            None
        } else {
            Some(self.context.project_path.clone().unwrap_or_else(|| PathBuf::from(".")))
        };

        let config_path = ConfigManager::get_config_path(path.clone())?;
        if config_path.exists() && !force {
            println!("Configuration already initialized at: {}", config_path.display());
            println!("Use --force to overwrite");
            return Ok(());
        }

        let config_manager = match path {
            None => ConfigManager::from_config(config_path.clone(), Default::default()),
            Some(project) => {
                let mut manager = ConfigManager::new_project_config(project)?;
                *manager.config_mut() = Default::default();
                manager
            }
        };
        config_manager.save()?;
        println!("Configuration initialized successfully at: {}", config_path.display());
        print!("{}", SETUP_HINT);

        Ok(())
    }

    pub async fn handle_config(&self, action: ConfigAction) -> Result<()> {
        // Reload so edits apply to the file the context resolved
        let mut config_manager = ConfigManager::new(self.context.project_path.clone())?;

        match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(config_manager.config())?);
            }
            ConfigAction::Set { key, value } => {
                config_manager.set_value(&key, &value)?;
                config_manager.save()?;
                println!("Configuration updated: {key} = {value}");
            }
            ConfigAction::Get { key } => {
                println!("{}", config_manager.get_value(&key)?);
            }
        }

        Ok(())
    }
}

const SETUP_HINT: &str = r#"
Point background sync at the notification store:
  quick-clinic-push config set store.base_url https://clinic.example.com
  quick-clinic-push config set store.user_id <patient-id>

Try the worker locally:
  echo '{"title": "Appointment Reminder", "data": {"url": "/patient/appointments/42"}}' | quick-clinic-push push
  quick-clinic-push simulate --open /patient/appointments/42 --payload '{"title": "Hi", "data": {"url": "/patient/appointments/42"}}'
"#;

super::traits::impl_context_handler!(ConfigHandler<'a>);
