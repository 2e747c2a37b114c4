//! Deferred background sync
//!
//! Handles the `sync` channel for the `sync-notifications` tag: pull the
//! user's unread records from the notification store, show each one, then
//! mark it read. Failures are logged and reported in the outcome but never
//! escape the handler.

use serde_json::{json, Map};
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult, ErrorContextExt};
use crate::store::NotificationRecord;
use super::payload::{NotificationDefaults, NotificationOptions};
use super::types::{HandlerOutcome, PendingWork, SyncEvent, WorkerContext};

/// Entry point registered for the `sync` channel
pub fn on_sync(ctx: WorkerContext, event: SyncEvent) -> PendingWork {
    Box::pin(async move { run_sync(&ctx, event).await })
}

pub async fn run_sync(ctx: &WorkerContext, event: SyncEvent) -> HandlerOutcome {
    if event.tag != ctx.defaults.sync_tag {
        debug!("Ignoring background sync for unrelated tag '{}'", event.tag);
        return HandlerOutcome::Ignored;
    }

    info!("Background sync '{}' started", event.tag);
    match sync_pending_notifications(ctx).await {
        Ok(Some(shown)) => {
            info!("Background sync '{}' showed {} pending notifications", event.tag, shown);
            HandlerOutcome::Synced { shown }
        }
        Ok(None) => HandlerOutcome::Ignored,
        Err(e) => {
            let cause = e.category();
            let e = AppError::sync(event.tag, e);
            warn!(category = cause, "{}", e);
            HandlerOutcome::failed(e)
        }
    }
}

/// Show every unread record for the configured user and mark it read.
///
/// Returns `None` when no store or user is configured. A record is only
/// marked read after the host accepted it, so a failed run leaves the rest
/// pending for the next sync.
pub async fn sync_pending_notifications(ctx: &WorkerContext) -> AppResult<Option<usize>> {
    let (store, user_id) = match (&ctx.store, &ctx.sync_user_id) {
        (Some(store), Some(user_id)) => (store, user_id),
        _ => {
            info!("No notification store configured, skipping background sync");
            return Ok(None);
        }
    };

    let pending: Vec<NotificationRecord> = store
        .list_for_user(user_id)
        .await
        .in_component("background sync")?
        .into_iter()
        .filter(|record| !record.is_read)
        .collect();
    debug!("{} pending notifications for user {}", pending.len(), user_id);

    let mut shown = 0;
    for record in pending {
        let (title, options) = notification_from_record(&record, &ctx.defaults);
        ctx.host
            .show_notification(&title, &options)
            .await
            .with_context_lazy(|| format!("showing synced notification {}", record.id))?;
        store
            .mark_read(user_id, &record.id)
            .await
            .with_context_lazy(|| format!("marking notification {} read", record.id))?;
        shown += 1;
    }

    Ok(Some(shown))
}

/// Display form of a stored record; each record gets its own tag
pub fn notification_from_record(
    record: &NotificationRecord,
    defaults: &NotificationDefaults,
) -> (String, NotificationOptions) {
    let url = record
        .related_entity
        .as_ref()
        .map(|entity| entity.patient_url())
        .unwrap_or_else(|| defaults.fallback_url.clone());

    let mut data = Map::new();
    data.insert("url".to_string(), json!(url));
    data.insert("notificationId".to_string(), json!(record.id));
    data.insert("type".to_string(), json!(record.kind));

    let options = NotificationOptions {
        body: record.message.clone(),
        icon: defaults.icon.clone(),
        badge: defaults.badge.clone(),
        tag: format!("notification-{}", record.id),
        require_interaction: false,
        actions: Vec::new(),
        data,
    };
    (record.title.clone(), options)
}
