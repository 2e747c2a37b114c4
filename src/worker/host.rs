//! Host platform interface
//!
//! The worker never owns notifications or client views; it issues commands
//! against a host that does. `SimulatedHost` is an in-memory host used by the
//! CLI and the test suite.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::{AppError, AppResult};
use super::payload::NotificationOptions;

/// Host-assigned identifier of a displayed notification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

/// Host-assigned identifier of an open client view
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    Window,
    Worker,
    SharedWorker,
}

/// An open browser tab or window as reported by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientView {
    pub id: ClientId,
    pub url: String,
    pub kind: ClientKind,
    /// Whether the view is controlled by this worker
    pub controlled: bool,
}

/// Filter for client enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientQuery {
    pub kind: ClientKind,
    pub include_uncontrolled: bool,
}

impl ClientQuery {
    /// Every window, including ones not controlled by this worker
    pub fn all_windows() -> Self {
        Self {
            kind: ClientKind::Window,
            include_uncontrolled: true,
        }
    }

    pub fn matches(&self, view: &ClientView) -> bool {
        view.kind == self.kind && (self.include_uncontrolled || view.controlled)
    }
}

/// A notification as rendered by the host, handed back on click
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShownNotification {
    pub id: NotificationId,
    pub title: String,
    pub options: NotificationOptions,
}

/// Capabilities the host platform offers the worker
///
/// Every method is a suspension point; implementations may complete them in
/// any order relative to other in-flight events.
#[async_trait]
pub trait HostPlatform: Send + Sync {
    /// Render a notification. Notifications sharing a tag replace each other.
    async fn show_notification(&self, title: &str, options: &NotificationOptions) -> AppResult<()>;

    /// Dismiss a displayed notification
    async fn close_notification(&self, id: &NotificationId) -> AppResult<()>;

    /// Enumerate open client views matching the query, in host order
    async fn match_all(&self, query: &ClientQuery) -> AppResult<Vec<ClientView>>;

    /// Bring an existing client view to the foreground
    async fn focus(&self, id: &ClientId) -> AppResult<()>;

    /// Whether `open_window` is available on this host
    fn supports_open_window(&self) -> bool;

    /// Open a new client view at the given URL
    async fn open_window(&self, url: &str) -> AppResult<ClientView>;
}

/// Record of a single call made against the simulated host
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    ShowNotification { title: String, tag: String },
    CloseNotification(NotificationId),
    MatchAll(ClientQuery),
    Focus(ClientId),
    OpenWindow(String),
}

/// Operations that can be made to fail on the simulated host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOperation {
    ShowNotification,
    CloseNotification,
    MatchAll,
    Focus,
    OpenWindow,
}

impl HostOperation {
    fn name(&self) -> &'static str {
        match self {
            Self::ShowNotification => "showNotification",
            Self::CloseNotification => "close",
            Self::MatchAll => "matchAll",
            Self::Focus => "focus",
            Self::OpenWindow => "openWindow",
        }
    }
}

#[derive(Debug, Default)]
struct SimulatedState {
    displayed: Vec<ShownNotification>,
    clients: Vec<ClientView>,
    calls: Vec<HostCall>,
    failing: Vec<HostOperation>,
    next_id: u64,
}

/// In-memory host platform
///
/// Keeps displayed notifications (collapsed by tag) and open client views,
/// and records every call so callers can inspect what the worker asked for.
#[derive(Debug, Clone)]
pub struct SimulatedHost {
    state: Arc<Mutex<SimulatedState>>,
    can_open_window: bool,
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimulatedState::default())),
            can_open_window: true,
        }
    }

    /// Host without the open-window capability
    pub fn without_open_window(mut self) -> Self {
        self.can_open_window = false;
        self
    }

    /// Make every subsequent call of `operation` fail
    pub fn failing_on(self, operation: HostOperation) -> Self {
        self.lock().failing.push(operation);
        self
    }

    /// Add an open window; uncontrolled windows are still visible to `match_all`
    pub fn with_window(self, url: impl Into<String>, controlled: bool) -> Self {
        self.add_client(url.into(), ClientKind::Window, controlled);
        self
    }

    pub fn add_client(&self, url: String, kind: ClientKind, controlled: bool) -> ClientView {
        let mut state = self.lock();
        state.next_id += 1;
        let view = ClientView {
            id: ClientId(format!("client-{}", state.next_id)),
            url,
            kind,
            controlled,
        };
        state.clients.push(view.clone());
        view
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.lock().calls.clone()
    }

    pub fn displayed(&self) -> Vec<ShownNotification> {
        self.lock().displayed.clone()
    }

    pub fn clients(&self) -> Vec<ClientView> {
        self.lock().clients.clone()
    }

    /// Most recently displayed notification carrying `tag`
    pub fn displayed_with_tag(&self, tag: &str) -> Option<ShownNotification> {
        self.lock()
            .displayed
            .iter()
            .rev()
            .find(|n| n.options.tag == tag)
            .cloned()
    }

    pub fn count_calls(&self, predicate: impl Fn(&HostCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    fn lock(&self) -> MutexGuard<'_, SimulatedState> {
        // A poisoned lock only means a test panicked mid-call; the state is still usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: HostCall, operation: HostOperation) -> AppResult<()> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing.contains(&operation) {
            return Err(AppError::host(operation.name(), "simulated failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl HostPlatform for SimulatedHost {
    async fn show_notification(&self, title: &str, options: &NotificationOptions) -> AppResult<()> {
        self.record(
            HostCall::ShowNotification {
                title: title.to_string(),
                tag: options.tag.clone(),
            },
            HostOperation::ShowNotification,
        )?;

        let mut state = self.lock();
        state.next_id += 1;
        let shown = ShownNotification {
            id: NotificationId(format!("notification-{}", state.next_id)),
            title: title.to_string(),
            options: options.clone(),
        };
        state.displayed.retain(|n| n.options.tag != shown.options.tag);
        state.displayed.push(shown);
        Ok(())
    }

    async fn close_notification(&self, id: &NotificationId) -> AppResult<()> {
        self.record(HostCall::CloseNotification(id.clone()), HostOperation::CloseNotification)?;
        self.lock().displayed.retain(|n| &n.id != id);
        Ok(())
    }

    async fn match_all(&self, query: &ClientQuery) -> AppResult<Vec<ClientView>> {
        self.record(HostCall::MatchAll(*query), HostOperation::MatchAll)?;
        Ok(self
            .lock()
            .clients
            .iter()
            .filter(|view| query.matches(view))
            .cloned()
            .collect())
    }

    async fn focus(&self, id: &ClientId) -> AppResult<()> {
        self.record(HostCall::Focus(id.clone()), HostOperation::Focus)?;
        if self.lock().clients.iter().any(|view| &view.id == id) {
            Ok(())
        } else {
            Err(AppError::ClientNotFound { client_id: id.to_string() })
        }
    }

    fn supports_open_window(&self) -> bool {
        self.can_open_window
    }

    async fn open_window(&self, url: &str) -> AppResult<ClientView> {
        if !self.can_open_window {
            return Err(AppError::host("openWindow", "not supported by this host"));
        }
        self.record(HostCall::OpenWindow(url.to_string()), HostOperation::OpenWindow)?;
        Ok(self.add_client(url.to_string(), ClientKind::Window, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::payload::NotificationOptions;

    fn options_with_tag(tag: &str) -> NotificationOptions {
        NotificationOptions {
            tag: tag.to_string(),
            ..NotificationOptions::default()
        }
    }

    #[tokio::test]
    async fn test_same_tag_collapses_to_one_entry() {
        let host = SimulatedHost::new();
        host.show_notification("First", &options_with_tag("visit")).await.unwrap();
        host.show_notification("Second", &options_with_tag("visit")).await.unwrap();
        host.show_notification("Other", &options_with_tag("billing")).await.unwrap();

        let displayed = host.displayed();
        assert_eq!(displayed.len(), 2);
        assert_eq!(host.displayed_with_tag("visit").unwrap().title, "Second");
    }

    #[tokio::test]
    async fn test_match_all_honours_query() {
        let host = SimulatedHost::new()
            .with_window("/a", true)
            .with_window("/b", false);
        host.add_client("/worker".into(), ClientKind::Worker, true);

        let all = host.match_all(&ClientQuery::all_windows()).await.unwrap();
        assert_eq!(all.len(), 2);

        let controlled = host
            .match_all(&ClientQuery { kind: ClientKind::Window, include_uncontrolled: false })
            .await
            .unwrap();
        assert_eq!(controlled.len(), 1);
        assert_eq!(controlled[0].url, "/a");
    }

    #[tokio::test]
    async fn test_failing_operation_is_recorded_and_errors() {
        let host = SimulatedHost::new().failing_on(HostOperation::ShowNotification);
        let result = host.show_notification("Title", &options_with_tag("t")).await;

        assert!(matches!(result, Err(AppError::Host { .. })));
        assert_eq!(host.calls().len(), 1);
        assert!(host.displayed().is_empty());
    }

    #[tokio::test]
    async fn test_focus_unknown_client() {
        let host = SimulatedHost::new();
        let result = host.focus(&ClientId("missing".into())).await;
        assert!(matches!(result, Err(AppError::ClientNotFound { .. })));
    }
}
