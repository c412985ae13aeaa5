//! Trigger mechanism: change notifications and a periodic resync feeding a
//! work queue drained by workers.
//!
//! Delivery is at-least-once and per-record serialized; the reconciler's
//! guard turns repeated deliveries into no-ops.
mod queue;
pub use queue::{WorkItem, WorkQueue};

mod watch;
pub use watch::{ChangeSource, ChannelSource};

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinSet, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::reconciler::{Action, Reconciler};

/// Default period of the full resync.
pub const DEFAULT_RESYNC_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Watched namespace; `None` watches all namespaces.
    pub namespace: Option<String>,
    /// Period of the full resync. Failed cycles are retried at this cadence.
    pub resync_interval: Duration,
    /// Concurrent reconcile workers.
    pub workers: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            resync_interval: DEFAULT_RESYNC_INTERVAL,
            workers: 4,
        }
    }
}

/// Drives the reconciler for every registered kind.
pub struct Controller {
    reconciler: Arc<Reconciler>,
    queue: WorkQueue<WorkItem>,
    sources: Vec<Arc<dyn ChangeSource>>,
    cfg: ControllerConfig,
}

impl Controller {
    pub fn new(reconciler: Arc<Reconciler>, cfg: ControllerConfig) -> Self {
        Self {
            reconciler,
            queue: WorkQueue::new(),
            sources: Vec::new(),
            cfg,
        }
    }

    /// Watch `source` for every registered kind while running.
    pub fn with_change_source(mut self, source: Arc<dyn ChangeSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Names of the registered change sources.
    pub fn change_sources(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Queue handle, for external triggers.
    pub fn queue(&self) -> &WorkQueue<WorkItem> {
        &self.queue
    }

    /// List every registered kind and enqueue each record. Returns the number listed.
    ///
    /// A failed listing is logged and skipped; the next resync retries it.
    pub async fn resync(&self) -> usize {
        let namespace = self.cfg.namespace.as_deref();
        let mut listed = 0;
        for kind in self.reconciler.kinds() {
            match self.reconciler.context().records().list(kind, namespace).await {
                Ok(records) => {
                    listed += records.len();
                    for record in records {
                        self.queue.add(WorkItem::new(kind, record.key()));
                    }
                }
                Err(e) => warn!(kind = %kind, error = %e, "resync listing failed"),
            }
        }
        debug!(listed, queued = self.queue.len(), "resync complete");
        listed
    }

    /// Run until `shutdown` fires. In-flight executions are aborted through
    /// the same token; returns after every worker has stopped.
    #[instrument(level = "debug", skip_all, fields(namespace = ?self.cfg.namespace))]
    pub async fn run(&self, shutdown: CancellationToken) {
        let workers = self.cfg.workers.max(1);
        let mut set = JoinSet::new();
        for id in 0..workers {
            set.spawn(worker(
                id,
                Arc::clone(&self.reconciler),
                self.queue.clone(),
                shutdown.clone(),
            ));
        }

        let mut watches = JoinSet::new();
        for source in &self.sources {
            for kind in self.reconciler.kinds() {
                let source = Arc::clone(source);
                let namespace = self.cfg.namespace.clone();
                let queue = self.queue.clone();
                let shutdown = shutdown.clone();
                watches.spawn(async move { source.watch(kind, namespace, queue, shutdown).await });
            }
        }
        info!(
            workers,
            watches = watches.len(),
            resync_ms = self.cfg.resync_interval.as_millis() as u64,
            "controller started"
        );

        let mut ticker = tokio::time::interval(self.cfg.resync_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.resync().await;
                }
            }
        }

        self.queue.shutdown();
        while let Some(res) = watches.join_next().await {
            if let Err(e) = res {
                error!(error = %e, "change source panicked");
            }
        }
        while let Some(res) = set.join_next().await {
            if let Err(e) = res {
                error!(error = %e, "reconcile worker panicked");
            }
        }
        info!("controller stopped");
    }
}

async fn worker(
    id: usize,
    reconciler: Arc<Reconciler>,
    queue: WorkQueue<WorkItem>,
    cancel: CancellationToken,
) {
    debug!(worker = id, "worker started");
    while let Some(item) = queue.get().await {
        match reconciler.reconcile(item.kind, &item.key, &cancel).await {
            Ok(Action::RequeueAfter(delay)) => queue.add_after(item.clone(), delay),
            Ok(Action::Done) => {}
            // Already logged by the reconciler; retried on the next resync.
            Err(_) => {}
        }
        queue.done(&item);
    }
    debug!(worker = id, "worker stopped");
}
