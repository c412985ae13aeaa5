use std::sync::Arc;

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

use djo_core::{MetricsBackend, ReconcileOutcome};

const NAMESPACE: &str = "djo";

/// Prometheus metrics for the reconcile loops.
///
/// Labels are bounded: `kind` is one of the four record kinds, `outcome`
/// a [`ReconcileOutcome`] label and `error_kind` an exec error category.
#[derive(Clone)]
pub struct PrometheusMetrics {
    started: CounterVec,
    completed: CounterVec,
    duration: HistogramVec,
    exec_errors: CounterVec,
    pruned: CounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Register the operator metrics in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let started = CounterVec::new(
            Opts::new("reconcile_started_total", "Reconcile cycles started").namespace(NAMESPACE),
            &["kind"],
        )?;
        registry.register(Box::new(started.clone()))?;

        let completed = CounterVec::new(
            Opts::new("reconcile_completed_total", "Reconcile cycles finished, by outcome")
                .namespace(NAMESPACE),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(completed.clone()))?;

        // Cycles are dominated by the remote command: migrations can take minutes.
        let duration = HistogramVec::new(
            HistogramOpts::new("reconcile_duration_seconds", "Reconcile cycle wall time")
                .namespace(NAMESPACE)
                .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0]),
            &["kind"],
        )?;
        registry.register(Box::new(duration.clone()))?;

        let exec_errors = CounterVec::new(
            Opts::new("exec_errors_total", "Failed in-pod command executions").namespace(NAMESPACE),
            &["kind", "error_kind"],
        )?;
        registry.register(Box::new(exec_errors.clone()))?;

        let pruned = CounterVec::new(
            Opts::new("pruned_records_total", "Completed records removed by retention")
                .namespace(NAMESPACE),
            &["kind"],
        )?;
        registry.register(Box::new(pruned.clone()))?;

        Ok(Self {
            started,
            completed,
            duration,
            exec_errors,
            pruned,
            registry,
        })
    }

    /// Create the backend with its own registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render all metrics in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_reconcile_started(&self, kind: &str) {
        self.started.with_label_values(&[kind]).inc();
    }

    fn record_reconcile_completed(&self, kind: &str, outcome: ReconcileOutcome, duration_ms: u64) {
        self.completed
            .with_label_values(&[kind, outcome.as_label()])
            .inc();
        self.duration
            .with_label_values(&[kind])
            .observe(duration_ms as f64 / 1000.0);
    }

    fn record_exec_error(&self, kind: &str, error_kind: &str) {
        self.exec_errors.with_label_values(&[kind, error_kind]).inc();
    }

    fn record_pruned(&self, kind: &str, count: u64) {
        if count > 0 {
            self.pruned.with_label_values(&[kind]).inc_by(count as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family<'a>(families: &'a [MetricFamily], name: &str) -> &'a MetricFamily {
        families
            .iter()
            .find(|f| f.name() == name)
            .unwrap_or_else(|| panic!("metric {name} not found"))
    }

    #[test]
    fn started_counter_is_labelled_by_kind() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.record_reconcile_started("migrate");
        metrics.record_reconcile_started("migrate");
        metrics.record_reconcile_started("create-user");

        let families = metrics.gather();
        let started = family(&families, "djo_reconcile_started_total");
        assert_eq!(started.get_metric().len(), 2);
    }

    #[test]
    fn completion_feeds_counter_and_histogram() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.record_reconcile_completed("migrate", ReconcileOutcome::Applied, 1500);
        metrics.record_reconcile_completed("migrate", ReconcileOutcome::Waiting, 3);

        let families = metrics.gather();
        assert_eq!(family(&families, "djo_reconcile_completed_total").get_metric().len(), 2);

        assert_eq!(family(&families, "djo_reconcile_duration_seconds").get_metric().len(), 1);

        let text = metrics.encode().unwrap();
        assert!(text.contains(r#"djo_reconcile_duration_seconds_count{kind="migrate"} 2"#));
    }

    #[test]
    fn pruned_counter_sums_counts() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.record_pruned("migrate", 2);
        metrics.record_pruned("migrate", 0);
        metrics.record_pruned("migrate", 1);

        let text = metrics.encode().unwrap();
        assert!(text.contains(r#"djo_pruned_records_total{kind="migrate"} 3"#));
    }

    #[test]
    fn encode_renders_text_format() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.record_exec_error("collect-static", "non_zero_exit");

        let text = metrics.encode().unwrap();
        assert!(text.contains("djo_exec_errors_total"));
        assert!(text.contains(r#"error_kind="non_zero_exit""#));
    }

    #[test]
    fn registering_twice_in_one_registry_fails() {
        let registry = Arc::new(Registry::new());
        PrometheusMetrics::new_with_registry(registry.clone()).unwrap();
        assert!(PrometheusMetrics::new_with_registry(registry).is_err());
    }
}
