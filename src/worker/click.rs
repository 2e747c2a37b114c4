//! Click router
//!
//! Handles the `notificationclick` channel. The notification is always closed
//! first; then the target URL is focused if some open window already shows it,
//! or opened in a new window otherwise.

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use super::host::{ClientQuery, ClientView};
use super::types::{ClickOutcome, HandlerOutcome, NotificationClickEvent, PendingWork, WorkerContext};

/// Entry point registered for the `notificationclick` channel
pub fn on_notification_click(ctx: WorkerContext, event: NotificationClickEvent) -> PendingWork {
    Box::pin(async move { route_click(&ctx, event).await })
}

pub async fn route_click(ctx: &WorkerContext, event: NotificationClickEvent) -> HandlerOutcome {
    let notification = event.notification;
    if let Some(action) = &event.action {
        debug!("Notification {} clicked via action '{}'", notification.id, action);
    }

    // Closing is unconditional and happens exactly once, before routing
    if let Err(e) = ctx.host.close_notification(&notification.id).await {
        warn!("Failed to close notification {}: {}", notification.id, e);
    }

    let target = target_url(&notification.options.data, &ctx.defaults.fallback_url);

    // Re-queried on every click; the worker never caches the view list
    let views = match ctx.host.match_all(&ClientQuery::all_windows()).await {
        Ok(views) => views,
        Err(e) => {
            error!("Failed to enumerate client views: {}", e);
            return HandlerOutcome::failed(e);
        }
    };

    if let Some(view) = find_matching_view(&views, &target) {
        return match ctx.host.focus(&view.id).await {
            Ok(()) => {
                debug!("Focused existing view {} at {}", view.id, target);
                HandlerOutcome::Routed(ClickOutcome::Focused {
                    client_id: view.id.clone(),
                    url: target,
                })
            }
            Err(e) => {
                error!("Failed to focus view {}: {}", view.id, e);
                HandlerOutcome::failed(e)
            }
        };
    }

    if !ctx.host.supports_open_window() {
        info!("No open view at {} and host cannot open windows", target);
        return HandlerOutcome::Routed(ClickOutcome::NoAction { url: target });
    }

    match ctx.host.open_window(&target).await {
        Ok(view) => {
            debug!("Opened view {} at {}", view.id, target);
            HandlerOutcome::Routed(ClickOutcome::Opened { url: target })
        }
        Err(e) => {
            error!("Failed to open window at {}: {}", target, e);
            HandlerOutcome::failed(e)
        }
    }
}

/// `data.url` when it is a non-empty string, otherwise the fallback
pub fn target_url(data: &Map<String, Value>, fallback: &str) -> String {
    match data.get("url") {
        Some(Value::String(url)) if !url.is_empty() => url.clone(),
        Some(unusable) => {
            debug!("Ignoring unusable data.url {}, routing to {}", unusable, fallback);
            fallback.to_string()
        }
        None => fallback.to_string(),
    }
}

/// First view in enumeration order whose URL equals the target exactly
pub fn find_matching_view<'a>(views: &'a [ClientView], target: &str) -> Option<&'a ClientView> {
    views.iter().find(|view| view.url == target)
}
