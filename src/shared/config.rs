use serde::{Deserialize, Serialize};

/// Main configuration structure for the Quick Clinic push worker
///
/// Contains the worker's display defaults, the notification store and OTP
/// provider endpoints, and logging options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied by the push and click handlers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub default_icon: String,
    pub default_badge: String,
    pub default_tag: String,
    pub fallback_url: String,
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,
    pub max_queue_size: usize,
}

fn default_sync_tag() -> String {
    "sync-notifications".to_string()
}

/// Server-side notification store used by background sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub base_url: Option<String>,
    pub auth_token: Option<String>,
    pub user_id: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

fn default_retry_attempts() -> u32 {
    3
}

/// External OTP provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub log_path: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            default_icon: "/icons/icon-192x192.png".to_string(),
            default_badge: "/icons/badge-72x72.png".to_string(),
            default_tag: "default".to_string(),
            fallback_url: "/".to_string(),
            sync_tag: default_sync_tag(),
            max_queue_size: 256,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_token: None,
            user_id: None,
            timeout_secs: Some(30),
            retry_attempts: default_retry_attempts(),
        }
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.otp.example.com".to_string(),
            api_key: None,
            timeout_secs: Some(10),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_path: None, // console logging only
        }
    }
}
