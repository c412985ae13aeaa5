//! Reconcile events rendered as structured log lines.
use async_trait::async_trait;
use tracing::{debug, info, warn};

use djo_core::events::{EventReason, ReconcileEvent, Subscribe};

/// Subscriber that logs every reconcile event.
///
/// Routine outcomes (skip, wait) go to DEBUG, state changes to INFO, and
/// failures to WARN: they are retried, so they are not errors of the operator.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventLogger;

#[async_trait]
impl Subscribe for EventLogger {
    async fn on_event(&self, e: &ReconcileEvent) {
        let kind = e.kind.as_str();
        let record = e.key.to_string();
        let reason = e.reason.as_str();
        let message = e.message.as_deref().unwrap_or("");
        let target = e.target.as_deref().unwrap_or("");

        match e.reason {
            EventReason::Skipped | EventReason::WaitingForTarget => {
                debug!(kind, record, reason, message, "reconcile event")
            }
            EventReason::Applied | EventReason::Pruned => {
                info!(kind, record, reason, target, message, "reconcile event")
            }
            EventReason::ExecFailed
            | EventReason::SecretFailed
            | EventReason::StoreFailed
            | EventReason::PruneFailed => {
                warn!(kind, record, reason, target, message, "reconcile event")
            }
        }
    }

    fn name(&self) -> &'static str {
        "event-logger"
    }
}

#[cfg(test)]
mod tests {
    use djo_model::{RecordKey, RecordKind};

    use super::*;

    #[tokio::test]
    async fn logs_every_reason() {
        let reasons = [
            EventReason::Skipped,
            EventReason::WaitingForTarget,
            EventReason::Applied,
            EventReason::ExecFailed,
            EventReason::SecretFailed,
            EventReason::StoreFailed,
            EventReason::Pruned,
            EventReason::PruneFailed,
        ];
        for reason in reasons {
            let event = ReconcileEvent::new(RecordKind::Migrate, RecordKey::new("shop", "m1"), reason)
                .with_message("detail");
            EventLogger.on_event(&event).await;
        }
    }
}
