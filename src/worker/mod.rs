//! Push-notification worker
//!
//! Three independent handlers subscribed by channel name:
//!
//! - `push`: [`dispatcher::on_push`] renders an inbound payload
//! - `notificationclick`: [`click::on_notification_click`] focuses or opens a view
//! - `sync`: [`sync::on_sync`] pulls pending notifications from the store
//!
//! Handlers are free functions returning a [`PendingWork`] future that the
//! host awaits before releasing the event. [`runtime::WorkerRuntime`] is the
//! event loop that feeds them.

pub mod types;
pub mod payload;
pub mod host;
pub mod dispatcher;
pub mod click;
pub mod sync;
pub mod registry;
pub mod runtime;

pub use host::{HostPlatform, SimulatedHost};
pub use payload::{NotificationOptions, NotificationPayload, PayloadParse};
pub use registry::EventRegistry;
pub use runtime::{run_events, WorkerHandle, WorkerRuntime};
pub use types::{
    ClickOutcome, HandlerOutcome, NotificationClickEvent, PendingWork, PushEvent, SyncEvent, WorkerContext,
    WorkerEvent,
};
