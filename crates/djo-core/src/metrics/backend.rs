use std::sync::Arc;

/// How one reconcile cycle ended, for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Command ran and the completion marker was written.
    Applied,
    /// Guard short-circuited: the record was already completed or is gone.
    Skipped,
    /// No execution target; requeued.
    Waiting,
    /// Secret, exec or store failure; the record stays pending.
    Failed,
    /// Shutdown aborted the cycle.
    Canceled,
}

impl ReconcileOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            ReconcileOutcome::Applied => "applied",
            ReconcileOutcome::Skipped => "skipped",
            ReconcileOutcome::Waiting => "waiting",
            ReconcileOutcome::Failed => "failed",
            ReconcileOutcome::Canceled => "canceled",
        }
    }
}

/// Backend metrics collection interface.
///
/// Every method takes the record kind label (`RecordKind::as_str`).
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record the start of a reconcile cycle.
    fn record_reconcile_started(&self, kind: &str);

    /// Record the end of a reconcile cycle with outcome and duration.
    ///
    /// # Arguments
    /// - `kind`: Record kind
    /// - `outcome`: How the cycle ended
    /// - `duration_ms`: Wall time of the cycle in milliseconds
    fn record_reconcile_completed(&self, kind: &str, outcome: ReconcileOutcome, duration_ms: u64);

    /// Record a failed command execution, by error category
    /// (`ExecError::kind_label`).
    fn record_exec_error(&self, kind: &str, error_kind: &str);

    /// Record records removed by the retention pruner.
    fn record_pruned(&self, kind: &str, count: u64);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
