//! Notification dispatcher
//!
//! Handles the `push` channel: parse the payload, resolve defaults and ask
//! the host to render exactly one notification.

use tracing::{debug, error, info, warn};

use super::payload::{NotificationPayload, PayloadParse};
use super::types::{HandlerOutcome, PendingWork, PushEvent, WorkerContext};

/// Entry point registered for the `push` channel
pub fn on_push(ctx: WorkerContext, event: PushEvent) -> PendingWork {
    Box::pin(async move { dispatch_push(&ctx, event).await })
}

/// Run a push event to completion. Never returns an error: every failure is
/// logged and folded into the outcome.
pub async fn dispatch_push(ctx: &WorkerContext, event: PushEvent) -> HandlerOutcome {
    let payload = match NotificationPayload::parse(event.data.as_deref()) {
        PayloadParse::Absent => {
            info!("Push event received without payload, nothing to show");
            return HandlerOutcome::Ignored;
        }
        PayloadParse::Malformed(e) => {
            warn!(category = e.category(), "Discarding malformed push payload: {}", e);
            return HandlerOutcome::rejected(e);
        }
        PayloadParse::Valid(payload) => payload,
    };

    let (title, options) = payload.resolve(&ctx.defaults);
    debug!("Showing notification '{}' with tag '{}'", title, options.tag);

    match ctx.host.show_notification(&title, &options).await {
        Ok(()) => HandlerOutcome::Shown {
            title,
            tag: options.tag,
        },
        Err(e) => {
            error!(category = e.category(), "Host failed to show notification '{}': {}", title, e);
            HandlerOutcome::failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::host::{HostCall, HostOperation, SimulatedHost};
    use std::sync::Arc;

    fn context(host: &SimulatedHost) -> WorkerContext {
        WorkerContext::new(Arc::new(host.clone()))
    }

    #[tokio::test]
    async fn test_well_formed_payload_shows_exactly_once() {
        let host = SimulatedHost::new();
        let outcome = on_push(
            context(&host),
            PushEvent::with_body(r#"{"title": "Visit confirmed", "body": "Dr. Rao, 10am", "tag": "visit-3"}"#),
        )
        .await;

        assert_eq!(
            outcome,
            HandlerOutcome::Shown { title: "Visit confirmed".into(), tag: "visit-3".into() }
        );
        assert_eq!(
            host.calls(),
            vec![HostCall::ShowNotification { title: "Visit confirmed".into(), tag: "visit-3".into() }]
        );
    }

    #[tokio::test]
    async fn test_missing_tag_defaults() {
        let host = SimulatedHost::new();
        on_push(context(&host), PushEvent::with_body(r#"{"title": "t", "body": "b"}"#)).await;

        let shown = host.displayed();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].options.tag, "default");
    }

    #[tokio::test]
    async fn test_absent_payload_makes_no_calls() {
        let host = SimulatedHost::new();
        let outcome = on_push(context(&host), PushEvent::empty()).await;

        assert_eq!(outcome, HandlerOutcome::Ignored);
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_rejected_without_calls() {
        let host = SimulatedHost::new();
        let outcome = on_push(context(&host), PushEvent::with_body("{oops")).await;

        assert!(matches!(outcome, HandlerOutcome::Rejected { .. }));
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_host_failure_is_contained() {
        let host = SimulatedHost::new().failing_on(HostOperation::ShowNotification);
        let outcome = on_push(context(&host), PushEvent::with_body(r#"{"title": "t"}"#)).await;

        assert!(matches!(outcome, HandlerOutcome::Failed { .. }));
        assert_eq!(host.calls().len(), 1);
    }
}
