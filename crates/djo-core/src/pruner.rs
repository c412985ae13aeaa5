//! Retention pruner: bounds the number of completed records per kind and namespace.
use tracing::{debug, info};

use djo_model::{DesiredStateRecord, RecordKind};

use crate::store::{RecordStore, StoreError};

/// How many completed records to keep; `0` disables pruning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    keep: usize,
}

impl RetentionPolicy {
    pub fn keep(keep: usize) -> Self {
        Self { keep }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Policy from a signed configuration value; zero and negatives disable pruning.
    pub fn from_count(count: i64) -> Self {
        Self {
            keep: usize::try_from(count).unwrap_or(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.keep > 0
    }

    pub fn retained(&self) -> usize {
        self.keep
    }
}

/// Result of one pruning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Names deleted, newest first.
    pub deleted: Vec<String>,
    /// Completed records left in place.
    pub retained: usize,
}

/// Delete all but the `keep` newest completed records of `kind` in `namespace`.
///
/// Records are ranked by creation timestamp; ties keep store order. Pending
/// records are never deleted and do not count towards `keep`. Stops at the
/// first failed deletion; records deleted before it stay deleted.
pub async fn prune(
    store: &dyn RecordStore,
    kind: RecordKind,
    namespace: &str,
    policy: RetentionPolicy,
) -> Result<PruneReport, StoreError> {
    if !policy.is_enabled() {
        return Ok(PruneReport::default());
    }

    let mut completed: Vec<DesiredStateRecord> = store
        .list(kind, Some(namespace))
        .await?
        .into_iter()
        .filter(|r| r.completed_at().is_some())
        .collect();

    if completed.len() <= policy.keep {
        debug!(kind = %kind, namespace, count = completed.len(), keep = policy.keep, "nothing to prune");
        return Ok(PruneReport {
            deleted: Vec::new(),
            retained: completed.len(),
        });
    }

    // Stable: equal timestamps keep store order.
    completed.sort_by(|a, b| b.meta.creation_timestamp.cmp(&a.meta.creation_timestamp));
    let excess = completed.split_off(policy.keep);

    let mut report = PruneReport {
        deleted: Vec::with_capacity(excess.len()),
        retained: completed.len(),
    };
    for record in excess {
        store.delete(kind, &record.key()).await?;
        info!(kind = %kind, record = %record.key(), "pruned completed record");
        report.deleted.push(record.meta.name);
    }
    Ok(report)
}
