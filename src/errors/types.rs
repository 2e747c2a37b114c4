//! Error types for the Quick Clinic push worker
//!
//! This module defines all error types that can occur throughout the worker,
//! its collaborator clients and the CLI, providing structured error handling
//! with proper context and source chains.

use thiserror::Error;
use std::path::PathBuf;

/// Main application error type
///
/// Variants are grouped by functional domain so callers can branch on
/// `category()` for logging and on `is_retryable()` for network clients.
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid configuration value for '{key}': {value}")]
    InvalidConfigValue {
        key: String,
        value: String,
    },

    // Push payload errors
    #[error("Malformed push payload: {reason}")]
    MalformedPayload {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Host platform errors
    #[error("Host platform call '{operation}' failed: {message}")]
    Host {
        operation: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Client view not found: {client_id}")]
    ClientNotFound {
        client_id: String,
    },

    // Worker runtime errors
    #[error("No handler registered for event channel '{channel}'")]
    UnknownEventChannel {
        channel: String,
    },

    #[error("Worker event queue is full ({capacity} events)")]
    QueueFull {
        capacity: usize,
    },

    #[error("Worker runtime has shut down")]
    WorkerStopped,

    #[error("Background sync failed for tag '{tag}': {message}")]
    Sync {
        tag: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Notification store errors
    #[error("Notification store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Notification not found: {id}")]
    NotificationNotFound {
        id: String,
    },

    #[error("Notification store retry limit exceeded after {attempts} attempts")]
    StoreRetryExhausted {
        attempts: u32,
    },

    // OTP provider errors
    #[error("Invalid phone number: {phone}")]
    InvalidPhoneNumber {
        phone: String,
    },

    #[error("Invalid OTP code: {reason}")]
    InvalidOtpCode {
        reason: String,
    },

    // I/O errors
    #[error("File I/O error for '{path}': {operation}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Serialization errors
    #[error("JSON serialization error: {context}")]
    JsonSerialization {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("JSON deserialization error: {context}")]
    JsonDeserialization {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("TOML parsing error: {context}")]
    TomlParsing {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Network and HTTP errors
    #[error("HTTP request failed: {method} {url}")]
    HttpRequest {
        method: String,
        url: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Network timeout after {timeout_secs} seconds")]
    NetworkTimeout {
        timeout_secs: u64,
    },

    #[error("HTTP {status_code}: {reason}")]
    HttpStatus {
        status_code: u16,
        reason: String,
    },

    #[error("Parse error for {input}: expected {expected}")]
    Parse {
        input: String,
        expected: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Catch-all
    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a new Config error with context
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new Config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new MalformedPayload error
    pub fn malformed_payload(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
            source: None,
        }
    }

    /// Create a new MalformedPayload error with source
    pub fn malformed_payload_with_source(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new Host error for a failed platform call
    pub fn host(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Host {
            operation: operation.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap the error that stopped a background sync run
    pub fn sync(tag: impl Into<String>, source: AppError) -> Self {
        Self::Sync {
            tag: tag.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new Store error with source
    pub fn store_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new I/O error with source
    pub fn io_with_source(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Check if this error is retryable (used by the store client)
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkTimeout { .. } => true,
            Self::HttpRequest { .. } => true,
            Self::HttpStatus { status_code, .. } => {
                // Retry on 5xx errors and some 4xx errors
                *status_code >= 500 || *status_code == 408 || *status_code == 429
            },
            _ => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } | Self::InvalidConfigValue { .. } => "config",
            Self::MalformedPayload { .. } => "payload",
            Self::Host { .. } | Self::ClientNotFound { .. } => "host",
            Self::UnknownEventChannel { .. } | Self::QueueFull { .. } | Self::WorkerStopped | Self::Sync { .. } => "worker",
            Self::Store { .. } | Self::NotificationNotFound { .. } | Self::StoreRetryExhausted { .. } => "store",
            Self::InvalidPhoneNumber { .. } | Self::InvalidOtpCode { .. } => "otp",
            Self::Io { .. } => "io",
            Self::JsonSerialization { .. } | Self::JsonDeserialization { .. } | Self::TomlParsing { .. } => "serialization",
            Self::HttpRequest { .. } | Self::NetworkTimeout { .. } | Self::HttpStatus { .. } => "network",
            Self::Parse { .. } => "validation",
            Self::Other { .. } => "internal",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let operation = match err.kind() {
            std::io::ErrorKind::NotFound => "file not found",
            std::io::ErrorKind::PermissionDenied => "permission denied",
            std::io::ErrorKind::TimedOut => "timeout",
            _ => "I/O operation",
        }.to_string();

        Self::Io {
            path: PathBuf::from("unknown"),
            operation,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() {
            Self::JsonDeserialization {
                context: format!("JSON syntax error at line {} column {}",
                    err.line(), err.column()),
                source: Some(Box::new(err)),
            }
        } else if err.is_data() {
            Self::JsonDeserialization {
                context: "JSON data error".to_string(),
                source: Some(Box::new(err)),
            }
        } else if err.is_eof() {
            Self::JsonDeserialization {
                context: "Unexpected end of JSON input".to_string(),
                source: Some(Box::new(err)),
            }
        } else {
            Self::JsonSerialization {
                context: "JSON serialization error".to_string(),
                source: Some(Box::new(err)),
            }
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::TomlParsing {
            context: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::NetworkTimeout {
                timeout_secs: 0, // reqwest does not expose the configured timeout
            }
        } else if let Some(status) = err.status() {
            Self::HttpStatus {
                status_code: status.as_u16(),
                reason: err.to_string(),
            }
        } else {
            Self::HttpRequest {
                method: "UNKNOWN".to_string(),
                url: err.url().map(|u| u.to_string()).unwrap_or_else(|| "unknown".to_string()),
                source: Some(Box::new(err)),
            }
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        Self::Parse {
            input: "URL".to_string(),
            expected: "valid URL format".to_string(),
            source: Some(Box::new(err)),
        }
    }
}
