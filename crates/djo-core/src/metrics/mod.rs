//! Metrics collection abstraction for the reconcile loops.
//!
//! Backends (prometheus, ...) implement [`MetricsBackend`] and are injected
//! through [`crate::reconciler::ReconcileContext`].
mod backend;
pub use backend::{MetricsBackend, MetricsHandle, ReconcileOutcome};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
