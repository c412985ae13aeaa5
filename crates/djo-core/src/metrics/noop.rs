use crate::metrics::backend::{MetricsBackend, ReconcileOutcome};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_reconcile_started(&self, _: &str) {}

    #[inline(always)]
    fn record_reconcile_completed(&self, _: &str, _: ReconcileOutcome, _: u64) {}

    #[inline(always)]
    fn record_exec_error(&self, _: &str, _: &str) {}

    #[inline(always)]
    fn record_pruned(&self, _: &str, _: u64) {}
}
