//! Event-dispatch table
//!
//! Maps channel names to free-function handlers. The standard table is built
//! once per process.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use super::click::on_notification_click;
use super::dispatcher::on_push;
use super::sync::on_sync;
use super::types::{
    HandlerOutcome, PendingWork, WorkerContext, WorkerEvent, NOTIFICATION_CLICK_CHANNEL, PUSH_CHANNEL,
    SYNC_CHANNEL,
};

/// Handler signature shared by every channel
pub type EventHandler = fn(WorkerContext, WorkerEvent) -> PendingWork;

static STANDARD: Lazy<EventRegistry> = Lazy::new(|| {
    let mut registry = EventRegistry::new();
    registry.register(PUSH_CHANNEL, route_push);
    registry.register(NOTIFICATION_CLICK_CHANNEL, route_click);
    registry.register(SYNC_CHANNEL, route_sync);
    registry
});

#[derive(Clone, Default)]
pub struct EventRegistry {
    handlers: HashMap<&'static str, EventHandler>,
}

impl EventRegistry {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The push, notificationclick and sync handlers
    pub fn standard() -> Self {
        STANDARD.clone()
    }

    pub fn register(&mut self, channel: &'static str, handler: EventHandler) {
        self.handlers.insert(channel, handler);
    }

    pub fn channels(&self) -> Vec<&'static str> {
        let mut channels: Vec<_> = self.handlers.keys().copied().collect();
        channels.sort_unstable();
        channels
    }

    /// Look up the handler for the event's channel and start it
    pub fn dispatch(&self, ctx: WorkerContext, event: WorkerEvent) -> AppResult<PendingWork> {
        let channel = event.channel();
        let handler = self
            .handlers
            .get(channel)
            .ok_or_else(|| AppError::UnknownEventChannel {
                channel: channel.to_string(),
            })?;
        debug!("Dispatching event on channel '{}'", channel);
        Ok(handler(ctx, event))
    }
}

fn route_push(ctx: WorkerContext, event: WorkerEvent) -> PendingWork {
    match event {
        WorkerEvent::Push(push) => on_push(ctx, push),
        other => wrong_channel(PUSH_CHANNEL, other),
    }
}

fn route_click(ctx: WorkerContext, event: WorkerEvent) -> PendingWork {
    match event {
        WorkerEvent::NotificationClick(click) => on_notification_click(ctx, click),
        other => wrong_channel(NOTIFICATION_CLICK_CHANNEL, other),
    }
}

fn route_sync(ctx: WorkerContext, event: WorkerEvent) -> PendingWork {
    match event {
        WorkerEvent::Sync(sync) => on_sync(ctx, sync),
        other => wrong_channel(SYNC_CHANNEL, other),
    }
}

fn wrong_channel(expected: &'static str, event: WorkerEvent) -> PendingWork {
    let reason = format!(
        "handler for '{}' received a '{}' event",
        expected,
        event.channel()
    );
    Box::pin(async move { HandlerOutcome::Rejected { reason } })
}
