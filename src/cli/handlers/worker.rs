//! Worker command handler
//!
//! Runs push, click and sync events through the worker runtime against an
//! in-process simulated host and prints what the host ended up doing.

use super::super::CliContext;
use crate::store::create_store_from_config;
use crate::worker::runtime::RuntimeReport;
use crate::worker::{
    run_events, ClickOutcome, HandlerOutcome, NotificationClickEvent, PushEvent, SimulatedHost, SyncEvent,
    WorkerContext, WorkerEvent,
};
use anyhow::{bail, Context, Result};
use std::io::{self, IsTerminal, Read};
use std::sync::Arc;
use tracing::{debug, info};

pub struct WorkerHandler<'a> {
    context: &'a CliContext,
}

impl<'a> WorkerHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    /// Deliver one push event and print the notification it produced
    pub async fn handle_push(&self, payload: Option<String>) -> Result<()> {
        let host = SimulatedHost::new();
        let outcome = self.deliver_push(&host, payload).await?;

        match outcome {
            HandlerOutcome::Shown { title, tag } => {
                println!("Notification shown: {title}");
                if let Some(shown) = host.displayed_with_tag(&tag) {
                    println!("{}", serde_json::to_string_pretty(&shown)?);
                }
                Ok(())
            }
            HandlerOutcome::Ignored => {
                println!("Push event carried no payload; nothing shown");
                Ok(())
            }
            other => bail_on(other),
        }
    }

    /// Deliver a push, then click the notification it produced
    pub async fn handle_simulate(
        &self,
        payload: Option<String>,
        open: Vec<String>,
        no_open_window: bool,
        action: Option<String>,
    ) -> Result<()> {
        let mut host = SimulatedHost::new();
        if no_open_window {
            host = host.without_open_window();
        }
        for url in open {
            host = host.with_window(url, true);
        }

        let tag = match self.deliver_push(&host, payload).await? {
            HandlerOutcome::Shown { title, tag } => {
                println!("Notification shown: {title}");
                tag
            }
            HandlerOutcome::Ignored => {
                println!("Push event carried no payload; nothing to click");
                return Ok(());
            }
            other => return bail_on(other),
        };

        let notification = host
            .displayed_with_tag(&tag)
            .with_context(|| format!("Notification tagged '{tag}' is no longer displayed"))?;
        let event = WorkerEvent::NotificationClick(NotificationClickEvent { notification, action });
        let outcome = self.run_single(self.worker_context(&host), event).await?;

        match outcome {
            HandlerOutcome::Routed(ClickOutcome::Focused { client_id, url }) => {
                println!("Click routed: focused {client_id} at {url}");
            }
            HandlerOutcome::Routed(ClickOutcome::Opened { url }) => {
                println!("Click routed: opened new window at {url}");
            }
            HandlerOutcome::Routed(ClickOutcome::NoAction { url }) => {
                println!("Click routed: no window at {url} and opening windows is unsupported");
            }
            other => return bail_on(other),
        }
        debug!("Open views after click: {:?}", host.clients());
        Ok(())
    }

    /// Fire a background sync against the configured notification store
    pub async fn handle_sync(&self, tag: String) -> Result<()> {
        let config = self.context.config_manager.config();
        let host = SimulatedHost::new();
        let mut ctx = self.worker_context(&host);

        if let (Some(store), Some(user_id)) = (create_store_from_config(&config.store)?, &config.store.user_id) {
            ctx = ctx.with_store(Arc::new(store), user_id.clone());
        }
        let has_store = ctx.store.is_some();

        match self.run_single(ctx, WorkerEvent::Sync(SyncEvent { tag: tag.clone() })).await? {
            HandlerOutcome::Synced { shown } => {
                println!("Synced {shown} pending notifications");
                for notification in host.displayed() {
                    println!("  {} ({})", notification.title, notification.options.tag);
                }
                Ok(())
            }
            HandlerOutcome::Ignored if !has_store => {
                println!("No notification store configured; set store.base_url and store.user_id");
                Ok(())
            }
            HandlerOutcome::Ignored => {
                println!("Sync tag '{tag}' is not handled; nothing to do");
                Ok(())
            }
            other => bail_on(other),
        }
    }

    async fn deliver_push(&self, host: &SimulatedHost, payload: Option<String>) -> Result<HandlerOutcome> {
        let body = match payload {
            Some(payload) => Some(payload),
            None => read_stdin_payload()?,
        };
        let event = match body {
            Some(body) => PushEvent::with_body(body),
            None => PushEvent::empty(),
        };
        self.run_single(self.worker_context(host), WorkerEvent::Push(event)).await
    }

    async fn run_single(&self, ctx: WorkerContext, event: WorkerEvent) -> Result<HandlerOutcome> {
        let RuntimeReport { completed } = run_events(ctx, vec![event]).await?;
        let completed = completed
            .into_iter()
            .next()
            .context("Worker stopped before the event completed")?;
        info!("Event on '{}' finished", completed.channel);
        Ok(completed.outcome)
    }

    fn worker_context(&self, host: &SimulatedHost) -> WorkerContext {
        WorkerContext::from_config(Arc::new(host.clone()), self.context.config_manager.config())
    }
}

/// Payload piped on stdin; a terminal or blank input means no payload
fn read_stdin_payload() -> Result<Option<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin
        .lock()
        .read_to_string(&mut buffer)
        .context("Failed to read payload from stdin")?;

    if buffer.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(buffer))
    }
}

fn bail_on(outcome: HandlerOutcome) -> Result<()> {
    match outcome {
        HandlerOutcome::Rejected { reason } => bail!("Event rejected: {reason}"),
        HandlerOutcome::Failed { reason } => bail!("Event failed: {reason}"),
        other => bail!("Unexpected worker outcome: {}", serde_json::to_string(&other)?),
    }
}

super::traits::impl_context_handler!(WorkerHandler<'a>);
