use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use djo_model::{RecordKey, RecordKind};

use crate::controller::{WorkItem, WorkQueue};

/// Source of change notifications for stored records.
///
/// The controller runs one `watch` per registered kind next to the periodic
/// resync; a source only speeds up delivery, the resync still guarantees it.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Add the key of every created or updated record of `kind` in
    /// `namespace` (`None` = all) to `queue` until `shutdown` fires.
    async fn watch(
        &self,
        kind: RecordKind,
        namespace: Option<String>,
        queue: WorkQueue<WorkItem>,
        shutdown: CancellationToken,
    );
}

/// In-process change source fed through [`ChannelSource::notify`].
///
/// Cheap to clone; clones share the channel.
#[derive(Debug, Clone)]
pub struct ChannelSource {
    tx: broadcast::Sender<WorkItem>,
}

impl Default for ChannelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelSource {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Announce a created or updated record. Dropped when nobody watches.
    pub fn notify(&self, kind: RecordKind, key: RecordKey) {
        let _ = self.tx.send(WorkItem::new(kind, key));
    }
}

#[async_trait]
impl ChangeSource for ChannelSource {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn watch(
        &self,
        kind: RecordKind,
        namespace: Option<String>,
        queue: WorkQueue<WorkItem>,
        shutdown: CancellationToken,
    ) {
        let mut rx = self.tx.subscribe();
        loop {
            let item = tokio::select! {
                _ = shutdown.cancelled() => return,
                item = rx.recv() => item,
            };
            match item {
                Ok(item) if item.kind == kind => {
                    if namespace.as_deref().is_none_or(|ns| ns == item.key.namespace) {
                        debug!(item = %item, "change notification");
                        queue.add(item);
                    }
                }
                Ok(_) => {}
                // The resync covers whatever was dropped.
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(kind = %kind, skipped = n, "change notifications lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;

    #[tokio::test]
    async fn notifications_are_filtered_by_kind_and_namespace() {
        let source = ChannelSource::new();
        let queue = WorkQueue::new();
        let shutdown = CancellationToken::new();

        let handle = {
            let source = source.clone();
            let queue = queue.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                source
                    .watch(RecordKind::Migrate, Some("shop".into()), queue, shutdown)
                    .await
            })
        };
        // Let the watch subscribe before notifying.
        while source.tx.receiver_count() == 0 {
            tokio::task::yield_now().await;
        }

        source.notify(RecordKind::Migrate, RecordKey::new("blog", "m0"));
        source.notify(RecordKind::CreateUser, RecordKey::new("shop", "u1"));
        source.notify(RecordKind::Migrate, RecordKey::new("shop", "m1"));

        let item = tokio::time::timeout(Duration::from_secs(5), queue.get())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item, WorkItem::new(RecordKind::Migrate, RecordKey::new("shop", "m1")));
        assert!(queue.is_empty());

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn source_is_object_safe() {
        let _: Arc<dyn ChangeSource> = Arc::new(ChannelSource::new());
    }
}
