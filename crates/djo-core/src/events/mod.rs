//! Diagnostic events emitted by the reconciler.
//!
//! Events are fire-and-forget: subscribers observe transitions, they never
//! influence the cycle.
mod collector;
pub use collector::EventCollector;

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;

use djo_model::{RecordKey, RecordKind};

/// Why an event was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventReason {
    /// Record already completed; nothing to do.
    Skipped,
    /// No live instance of the workload; the record was requeued.
    WaitingForTarget,
    /// Command ran and the completion marker was written.
    Applied,
    ExecFailed,
    SecretFailed,
    StoreFailed,
    /// Retention pruner removed completed records.
    Pruned,
    PruneFailed,
}

impl EventReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventReason::Skipped => "Skipped",
            EventReason::WaitingForTarget => "WaitingForTarget",
            EventReason::Applied => "Applied",
            EventReason::ExecFailed => "ExecFailed",
            EventReason::SecretFailed => "SecretFailed",
            EventReason::StoreFailed => "StoreFailed",
            EventReason::Pruned => "Pruned",
            EventReason::PruneFailed => "PruneFailed",
        }
    }

    /// Failure reasons; the record stays pending (or pruning stays incomplete).
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EventReason::ExecFailed
                | EventReason::SecretFailed
                | EventReason::StoreFailed
                | EventReason::PruneFailed
        )
    }
}

/// One diagnostic event about a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileEvent {
    pub kind: RecordKind,
    pub key: RecordKey,
    pub reason: EventReason,
    pub message: Option<String>,
    /// `namespace/pod:container` the command ran against, when one was resolved.
    pub target: Option<String>,
    pub at: OffsetDateTime,
}

impl ReconcileEvent {
    pub fn new(kind: RecordKind, key: RecordKey, reason: EventReason) -> Self {
        Self {
            kind,
            key,
            reason,
            message: None,
            target: None,
            at: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Receiver of reconcile events.
#[async_trait]
pub trait Subscribe: Send + Sync {
    async fn on_event(&self, event: &ReconcileEvent);

    /// Subscriber name used in logs.
    fn name(&self) -> &'static str;
}

/// Fan-out of events to every registered subscriber, in registration order.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub async fn publish(&self, event: ReconcileEvent) {
        for sub in &self.subscribers {
            sub.on_event(&event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_every_event() {
        let a = Arc::new(EventCollector::new());
        let b = Arc::new(EventCollector::new());
        let bus = EventBus::new().with_subscriber(a.clone()).with_subscriber(b.clone());

        let key = RecordKey::new("shop", "m1");
        bus.publish(ReconcileEvent::new(RecordKind::Migrate, key.clone(), EventReason::Applied))
            .await;
        bus.publish(ReconcileEvent::new(RecordKind::Migrate, key, EventReason::Skipped))
            .await;

        assert_eq!(a.reasons(), vec![EventReason::Applied, EventReason::Skipped]);
        assert_eq!(b.reasons(), a.reasons());
    }
}
