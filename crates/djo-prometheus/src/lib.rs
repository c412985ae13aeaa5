//! Prometheus backend for the operator's reconcile metrics.
//!
//! [`PrometheusMetrics`] implements [`djo_core::MetricsBackend`]; hand an
//! `Arc` of it to `ReconcileContext::with_metrics` and serve
//! [`PrometheusMetrics::encode`] from a `/metrics` endpoint.
//!
//! ## Metrics
//! - `djo_reconcile_started_total{kind}` - Counter
//! - `djo_reconcile_completed_total{kind, outcome}` - Counter
//! - `djo_reconcile_duration_seconds{kind}` - Histogram
//! - `djo_exec_errors_total{kind, error_kind}` - Counter
//! - `djo_pruned_records_total{kind}` - Counter
mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
