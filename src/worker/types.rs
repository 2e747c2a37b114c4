//! Type definitions for worker events and handler results
//!
//! Events carry everything a handler needs; handlers keep no state between
//! invocations beyond the shared `WorkerContext`.

use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::Config;
use crate::store::NotificationStore;
use super::host::{ClientId, HostPlatform, ShownNotification};
use super::payload::NotificationDefaults;

pub const PUSH_CHANNEL: &str = "push";
pub const NOTIFICATION_CLICK_CHANNEL: &str = "notificationclick";
pub const SYNC_CHANNEL: &str = "sync";

/// Inbound push delivery; `data` is the raw body, if any
#[derive(Debug, Clone, Default)]
pub struct PushEvent {
    pub data: Option<Vec<u8>>,
}

impl PushEvent {
    pub fn with_body(body: impl Into<Vec<u8>>) -> Self {
        Self { data: Some(body.into()) }
    }

    pub fn empty() -> Self {
        Self { data: None }
    }
}

/// User interaction with a previously shown notification
#[derive(Debug, Clone)]
pub struct NotificationClickEvent {
    pub notification: ShownNotification,
    /// Action button pressed, `None` for a click on the notification body
    pub action: Option<String>,
}

/// Deferred background sync trigger
#[derive(Debug, Clone)]
pub struct SyncEvent {
    pub tag: String,
}

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Push(PushEvent),
    NotificationClick(NotificationClickEvent),
    Sync(SyncEvent),
}

impl WorkerEvent {
    /// Name of the channel this event is delivered on
    pub fn channel(&self) -> &'static str {
        match self {
            Self::Push(_) => PUSH_CHANNEL,
            Self::NotificationClick(_) => NOTIFICATION_CLICK_CHANNEL,
            Self::Sync(_) => SYNC_CHANNEL,
        }
    }
}

/// What the click router did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum ClickOutcome {
    Focused { client_id: ClientId, url: String },
    Opened { url: String },
    /// No matching view and the host cannot open one
    NoAction { url: String },
}

/// Result of running one event to completion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HandlerOutcome {
    /// Nothing to do for this event
    Ignored,
    Shown { title: String, tag: String },
    /// The event was not acted on because its input was unusable
    Rejected { reason: String },
    Routed(ClickOutcome),
    Synced { shown: usize },
    /// A platform or collaborator call failed; already logged
    Failed { reason: String },
}

impl HandlerOutcome {
    pub fn failed(reason: impl ToString) -> Self {
        Self::Failed { reason: reason.to_string() }
    }

    pub fn rejected(reason: impl ToString) -> Self {
        Self::Rejected { reason: reason.to_string() }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Rejected { .. })
    }
}

/// Lifetime-extension handle: the host keeps the event alive until this resolves
pub type PendingWork = Pin<Box<dyn Future<Output = HandlerOutcome> + Send + 'static>>;

/// Shared, read-only context handed to every handler invocation
#[derive(Clone)]
pub struct WorkerContext {
    pub host: Arc<dyn HostPlatform>,
    pub defaults: NotificationDefaults,
    pub store: Option<Arc<dyn NotificationStore>>,
    /// Whose pending notifications background sync pulls
    pub sync_user_id: Option<String>,
}

impl WorkerContext {
    pub fn new(host: Arc<dyn HostPlatform>) -> Self {
        Self {
            host,
            defaults: NotificationDefaults::default(),
            store: None,
            sync_user_id: None,
        }
    }

    pub fn from_config(host: Arc<dyn HostPlatform>, config: &Config) -> Self {
        Self {
            host,
            defaults: NotificationDefaults::from(&config.worker),
            store: None,
            sync_user_id: config.store.user_id.clone(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn NotificationStore>, user_id: impl Into<String>) -> Self {
        self.store = Some(store);
        self.sync_user_id = Some(user_id.into());
        self
    }
}
