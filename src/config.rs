use crate::errors::{AppError, AppResult};
use directories::BaseDirs;
use std::fs;
use std::path::{Path, PathBuf};

// Re-export shared types for convenience
pub use crate::shared::config::{Config, LoggingConfig, OtpConfig, StoreConfig, WorkerConfig};

/// Configuration manager for the Quick Clinic push worker
///
/// Handles loading, saving, and managing configuration for both project-level
/// and global configurations. Project configurations take precedence over global ones.
///
/// # Configuration Hierarchy
///
/// 1. **Project-level**: `.quick-clinic/push/config.toml` in project root
/// 2. **Global**: `~/.quick-clinic/push/config.toml` in user home directory
///
/// # Example
///
/// ```rust,no_run
/// use quick_clinic_push::config::ConfigManager;
/// use std::path::PathBuf;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config_manager = ConfigManager::new(Some(PathBuf::from("/path/to/project")))?;
///     println!("Fallback url: {}", config_manager.config().worker.fallback_url);
///     Ok(())
/// }
/// ```
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Creates a new ConfigManager instance
    ///
    /// If a project path is provided, the project configuration is used when it
    /// exists, then the global configuration when that exists; otherwise a
    /// default project configuration is created.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The configuration directory cannot be created
    /// - The configuration file cannot be read or parsed
    /// - Default configuration cannot be serialized and written
    pub fn new(project_path: Option<PathBuf>) -> AppResult<Self> {
        if let Some(ref path) = project_path {
            let project_config_path = Self::get_config_path(Some(path.clone()))?;

            if project_config_path.exists() {
                let config = Self::load_or_create(&project_config_path)?;
                return Ok(ConfigManager {
                    config_path: project_config_path,
                    config,
                });
            }

            let global_config_path = Self::get_config_path(None)?;
            if global_config_path.exists() {
                let config = Self::load_or_create(&global_config_path)?;
                return Ok(ConfigManager {
                    config_path: global_config_path,
                    config,
                });
            }

            let config = Self::load_or_create(&project_config_path)?;
            Ok(ConfigManager {
                config_path: project_config_path,
                config,
            })
        } else {
            let config_path = Self::get_config_path(None)?;
            let config = Self::load_or_create(&config_path)?;
            Ok(ConfigManager {
                config_path,
                config,
            })
        }
    }

    /// Creates or loads the project-level configuration even when a global one exists
    pub fn new_project_config(project_path: PathBuf) -> AppResult<Self> {
        let config_path = Self::get_config_path(Some(project_path))?;
        let config = Self::load_or_create(&config_path)?;

        Ok(ConfigManager {
            config_path,
            config,
        })
    }

    /// Wraps an in-memory configuration, used by tests and one-off commands
    pub fn from_config(config_path: PathBuf, config: Config) -> Self {
        Self { config_path, config }
    }

    pub fn get_config_path(project_path: Option<PathBuf>) -> AppResult<PathBuf> {
        let base_path = if let Some(path) = project_path {
            path.join(".quick-clinic").join("push")
        } else {
            let base_dirs = BaseDirs::new().ok_or_else(|| AppError::config("Failed to get base directories"))?;
            base_dirs.home_dir().join(".quick-clinic").join("push")
        };

        fs::create_dir_all(&base_path)
            .map_err(|e| AppError::io_with_source(&base_path, "create config directory", e))?;

        Ok(base_path.join("config.toml"))
    }

    fn load_or_create(path: &Path) -> AppResult<Config> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| AppError::io_with_source(path, "read config file", e))?;
            toml::from_str(&content)
                .map_err(|e| AppError::config_with_source("Failed to parse config file", e))
        } else {
            let config = Config::default();
            let content = toml::to_string_pretty(&config)
                .map_err(|e| AppError::config_with_source("Failed to serialize default config", e))?;
            fs::write(path, content)
                .map_err(|e| AppError::io_with_source(path, "write default config", e))?;
            Ok(config)
        }
    }

    /// Saves the current configuration to the TOML file it was loaded from
    pub fn save(&self) -> AppResult<()> {
        let content = toml::to_string_pretty(&self.config)
            .map_err(|e| AppError::config_with_source("Failed to serialize config", e))?;
        fs::write(&self.config_path, content)
            .map_err(|e| AppError::io_with_source(&self.config_path, "write config file", e))?;
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access; call [`save()`](Self::save) to persist changes.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Reads a single dotted key as a display string
    pub fn get_value(&self, key: &str) -> AppResult<String> {
        let config = &self.config;
        let value = match key {
            "worker.default_icon" => config.worker.default_icon.clone(),
            "worker.default_badge" => config.worker.default_badge.clone(),
            "worker.default_tag" => config.worker.default_tag.clone(),
            "worker.fallback_url" => config.worker.fallback_url.clone(),
            "worker.sync_tag" => config.worker.sync_tag.clone(),
            "worker.max_queue_size" => config.worker.max_queue_size.to_string(),
            "store.base_url" => display_optional(&config.store.base_url),
            "store.user_id" => display_optional(&config.store.user_id),
            "store.retry_attempts" => config.store.retry_attempts.to_string(),
            "otp.base_url" => config.otp.base_url.clone(),
            "logging.level" => config.logging.level.clone(),
            "logging.log_path" => display_optional(&config.logging.log_path),
            _ => return Err(AppError::InvalidConfigValue {
                key: key.to_string(),
                value: "unknown key".to_string(),
            }),
        };
        Ok(value)
    }

    /// Sets a single dotted key; an empty string clears optional values
    pub fn set_value(&mut self, key: &str, value: &str) -> AppResult<()> {
        let invalid = || AppError::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let config = &mut self.config;
        match key {
            "worker.default_icon" => config.worker.default_icon = value.to_string(),
            "worker.default_badge" => config.worker.default_badge = value.to_string(),
            "worker.default_tag" => {
                if value.is_empty() {
                    return Err(invalid());
                }
                config.worker.default_tag = value.to_string()
            }
            "worker.fallback_url" => config.worker.fallback_url = value.to_string(),
            "worker.sync_tag" => config.worker.sync_tag = value.to_string(),
            "worker.max_queue_size" => {
                let size: usize = value.parse().map_err(|_| invalid())?;
                if size == 0 {
                    return Err(invalid());
                }
                config.worker.max_queue_size = size;
            }
            "store.base_url" => config.store.base_url = optional(value),
            "store.auth_token" => config.store.auth_token = optional(value),
            "store.user_id" => config.store.user_id = optional(value),
            "store.retry_attempts" => {
                config.store.retry_attempts = value.parse().map_err(|_| invalid())?
            }
            "otp.base_url" => config.otp.base_url = value.to_string(),
            "otp.api_key" => config.otp.api_key = optional(value),
            "logging.level" => config.logging.level = value.to_string(),
            "logging.log_path" => config.logging.log_path = optional(value),
            _ => return Err(AppError::InvalidConfigValue {
                key: key.to_string(),
                value: "unknown key".to_string(),
            }),
        }
        Ok(())
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn display_optional(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "None".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_config_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::new_project_config(temp_dir.path().to_path_buf()).unwrap();

        assert!(temp_dir.path().join(".quick-clinic/push/config.toml").exists());
        assert_eq!(manager.config().worker.default_tag, "default");
    }

    #[test]
    fn test_set_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new_project_config(temp_dir.path().to_path_buf()).unwrap();
        manager.set_value("store.base_url", "http://localhost:5000").unwrap();
        manager.set_value("worker.max_queue_size", "8").unwrap();
        manager.save().unwrap();

        let reloaded = ConfigManager::new_project_config(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.get_value("store.base_url").unwrap(), "http://localhost:5000");
        assert_eq!(reloaded.config().worker.max_queue_size, 8);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new_project_config(temp_dir.path().to_path_buf()).unwrap();
        assert!(manager.set_value("worker.max_queue_size", "zero").is_err());
        assert!(manager.set_value("worker.max_queue_size", "0").is_err());
        assert!(manager.set_value("worker.default_tag", "").is_err());
        assert!(manager.set_value("no.such.key", "1").is_err());
    }

    #[test]
    fn test_empty_value_clears_optional() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new_project_config(temp_dir.path().to_path_buf()).unwrap();
        manager.set_value("store.user_id", "patient-1").unwrap();
        manager.set_value("store.user_id", "").unwrap();
        assert_eq!(manager.get_value("store.user_id").unwrap(), "None");
    }

    #[test]
    fn test_unparseable_config_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigManager::get_config_path(Some(temp_dir.path().to_path_buf())).unwrap();
        fs::write(&path, "worker = [").unwrap();
        let result = ConfigManager::new_project_config(temp_dir.path().to_path_buf());
        assert!(matches!(result, Err(AppError::Config { .. })));
    }
}
