use std::{fmt, sync::Arc, time::Duration};

use crate::{
    events::EventBus,
    exec::CommandExecutor,
    locator::WorkloadLocator,
    metrics::{MetricsHandle, noop_metrics},
    pruner::RetentionPolicy,
    store::{RecordStore, SecretStore},
};

/// Delay before re-examining a record whose workload has no live instance.
pub const DEFAULT_NOT_FOUND_REQUEUE: Duration = Duration::from_secs(10);

/// Collaborators and settings shared by every reconcile cycle.
#[derive(Clone)]
pub struct ReconcileContext {
    records: Arc<dyn RecordStore>,
    secrets: Arc<dyn SecretStore>,
    locator: WorkloadLocator,
    executor: Arc<dyn CommandExecutor>,
    metrics: MetricsHandle,
    events: EventBus,
    retention: RetentionPolicy,
    not_found_requeue: Duration,
}

impl ReconcileContext {
    /// Context with no-op metrics, no subscribers, pruning disabled and
    /// the default not-found requeue.
    pub fn new(
        records: Arc<dyn RecordStore>,
        secrets: Arc<dyn SecretStore>,
        locator: WorkloadLocator,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            records,
            secrets,
            locator,
            executor,
            metrics: noop_metrics(),
            events: EventBus::default(),
            retention: RetentionPolicy::disabled(),
            not_found_requeue: DEFAULT_NOT_FOUND_REQUEUE,
        }
    }

    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    pub fn secrets(&self) -> &Arc<dyn SecretStore> {
        &self.secrets
    }

    pub fn locator(&self) -> &WorkloadLocator {
        &self.locator
    }

    pub fn executor(&self) -> &Arc<dyn CommandExecutor> {
        &self.executor
    }

    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    pub fn not_found_requeue(&self) -> Duration {
        self.not_found_requeue
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_not_found_requeue(mut self, delay: Duration) -> Self {
        self.not_found_requeue = delay;
        self
    }
}

impl fmt::Debug for ReconcileContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconcileContext")
            .field("selector", &self.locator.selector().to_string())
            .field("executor", &self.executor.name())
            .field("subscribers", &self.events.len())
            .field("retention", &self.retention)
            .field("not_found_requeue", &self.not_found_requeue)
            .finish()
    }
}
