//! CLI Context for dependency injection and shared state
//!
//! This module provides the CliContext abstraction that centralizes
//! configuration management and logging setup for CLI handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use crate::config::ConfigManager;

/// CLI execution context containing shared dependencies and configuration
#[derive(Clone)]
pub struct CliContext {
    pub project_path: Option<PathBuf>,
    pub verbose: bool,
    pub config_manager: Arc<ConfigManager>,
}

impl CliContext {
    /// Create a new CLI context with the specified project path and verbosity
    pub fn new(project_path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let resolved_project_path = Self::resolve_project_path(project_path);
        let config_manager = Arc::new(ConfigManager::new(resolved_project_path.clone())?);

        Ok(Self {
            project_path: resolved_project_path,
            verbose,
            config_manager,
        })
    }

    /// Auto-detect project path by looking for .quick-clinic/push/config.toml
    fn resolve_project_path(project_path: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = project_path {
            return Some(path);
        }

        if let Ok(current_dir) = std::env::current_dir() {
            let config_path = current_dir.join(".quick-clinic").join("push").join("config.toml");
            if config_path.exists() {
                return Some(current_dir);
            }
        }

        // No project config found, use global config
        None
    }

    /// Initialize logging to stderr, plus a daily rolling file when
    /// `logging.log_path` is set. The returned guard must outlive the command.
    pub fn init_logging(&self) -> Result<Option<WorkerGuard>> {
        let logging = &self.config_manager.config().logging;
        let log_level = if self.verbose { "debug" } else { logging.level.as_str() };

        let env_filter = tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(log_level.parse().unwrap_or_else(|_| tracing::Level::INFO.into()));

        let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

        let guard = match &logging.log_path {
            Some(log_path) => {
                let log_path = PathBuf::from(log_path);
                let directory = log_path.parent().unwrap_or_else(|| Path::new("."));
                std::fs::create_dir_all(directory).context("Failed to create log directory")?;

                let file_appender = tracing_appender::rolling::daily(
                    directory,
                    log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("push-worker.log")),
                );
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(console_layer)
                    .with(file_layer)
                    .try_init()
                    .context("Failed to initialize logging")?;
                Some(guard)
            }
            None => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(console_layer)
                    .try_init()
                    .context("Failed to initialize logging")?;
                None
            }
        };

        if self.verbose {
            tracing::debug!("Verbose logging enabled");
            tracing::debug!("Project path: {:?}", self.project_path);
            tracing::debug!("Config path: {:?}", self.config_manager.config_path());
        }

        Ok(guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_creation() {
        let temp_dir = TempDir::new().unwrap();
        let context = CliContext::new(Some(temp_dir.path().to_path_buf()), false).unwrap();

        assert_eq!(context.project_path, Some(temp_dir.path().to_path_buf()));
        assert!(!context.verbose);
        assert_eq!(context.config_manager.config().worker.default_tag, "default");
    }

    #[test]
    fn test_explicit_project_path_wins() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = CliContext::resolve_project_path(Some(temp_dir.path().to_path_buf()));
        assert_eq!(resolved, Some(temp_dir.path().to_path_buf()));
    }

    #[test]
    fn test_context_verbose_mode() {
        let temp_dir = TempDir::new().unwrap();
        let context = CliContext::new(Some(temp_dir.path().to_path_buf()), true).unwrap();

        assert!(context.verbose);
        assert_eq!(context.project_path, Some(temp_dir.path().to_path_buf()));
    }
}
