//! Server-side notification store clients
//!
//! The clinic backend persists notification records per user and exposes
//! list, mark-read, mark-all-read, delete and unread-count operations behind
//! its own authentication. Background sync talks to it through the
//! `NotificationStore` trait; `MemoryNotificationStore` backs tests and
//! offline runs, `HttpNotificationStore` talks to the real backend.

pub mod types;
pub mod memory;
pub mod http;

use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::errors::{AppError, AppResult};

pub use types::{NewNotification, NotificationKind, NotificationRecord, RelatedEntity};
pub use memory::MemoryNotificationStore;
pub use http::HttpNotificationStore;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// All records for the user, newest first
    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<NotificationRecord>>;

    async fn mark_read(&self, user_id: &str, id: &str) -> AppResult<NotificationRecord>;

    /// Returns how many records changed state
    async fn mark_all_read(&self, user_id: &str) -> AppResult<usize>;

    async fn delete(&self, user_id: &str, id: &str) -> AppResult<()>;

    async fn unread_count(&self, user_id: &str) -> AppResult<usize>;
}

/// Build the HTTP store client from configuration, if a base URL is configured
pub fn create_store_from_config(config: &StoreConfig) -> AppResult<Option<HttpNotificationStore>> {
    match &config.base_url {
        Some(url) if !url.trim().is_empty() => HttpNotificationStore::new(config).map(Some),
        Some(_) => Err(AppError::InvalidConfigValue {
            key: "store.base_url".to_string(),
            value: String::new(),
        }),
        None => Ok(None),
    }
}
