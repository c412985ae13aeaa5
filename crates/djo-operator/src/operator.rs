use std::sync::Arc;

use tracing::info;

use djo_core::{
    controller::{Controller, ControllerConfig},
    events::EventBus,
    exec::CommandExecutor,
    intent::HandlerRouter,
    locator::WorkloadLocator,
    pruner::RetentionPolicy,
    reconciler::{ReconcileContext, Reconciler},
    store::{PodSource, RecordStore, SecretStore},
};
use djo_exec::kubectl::{
    Kubectl, KubectlExecutor, KubectlPodSource, KubectlRecordStore, KubectlSecretStore,
    KubectlWatchSource,
};
use djo_observe::EventLogger;
use djo_prometheus::PrometheusMetrics;

use crate::config::OperatorConfig;

/// Wire the kubectl-backed collaborators, the default handlers and the
/// metrics backend into a controller.
pub fn build(cfg: &OperatorConfig) -> anyhow::Result<(Controller, PrometheusMetrics)> {
    let kubectl = Kubectl::new((&cfg.kubectl).into());

    let records: Arc<dyn RecordStore> = Arc::new(KubectlRecordStore::new(kubectl.clone()));
    let pods: Arc<dyn PodSource> = Arc::new(KubectlPodSource::new(kubectl.clone()));
    let secrets: Arc<dyn SecretStore> = Arc::new(KubectlSecretStore::new(kubectl.clone()));
    let watch = cfg
        .watch
        .is_enabled()
        .then(|| KubectlWatchSource::new(kubectl.clone()));
    let executor: Arc<dyn CommandExecutor> = Arc::new(
        KubectlExecutor::new(kubectl)
            .with_timeout(cfg.exec_timeout())
            .with_fail_on_non_zero(cfg.fail_on_non_zero),
    );

    let metrics = PrometheusMetrics::new()?;
    let retention = RetentionPolicy::from_count(cfg.keep_records);
    let ctx = ReconcileContext::new(records, secrets, WorkloadLocator::new(pods, cfg.selector()?), executor)
        .with_metrics(Arc::new(metrics.clone()))
        .with_events(EventBus::new().with_subscriber(Arc::new(EventLogger)))
        .with_retention(retention)
        .with_not_found_requeue(cfg.not_found_requeue());

    let reconciler = Reconciler::new(HandlerRouter::with_defaults(), ctx)?;
    let controller_cfg = ControllerConfig {
        namespace: cfg.watched_namespace(),
        resync_interval: cfg.resync_interval(),
        workers: cfg.workers,
    };

    info!(
        namespace = controller_cfg.namespace.as_deref().unwrap_or("<all>"),
        selector = %cfg.pod_selector,
        keep = retention.retained(),
        pruning = retention.is_enabled(),
        workers = controller_cfg.workers,
        watch = watch.is_some(),
        kinds = ?reconciler.kinds(),
        "operator configured"
    );

    let mut controller = Controller::new(Arc::new(reconciler), controller_cfg);
    if let Some(watch) = watch {
        controller = controller.with_change_source(Arc::new(watch));
    }
    Ok((controller, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_defaults() {
        let (controller, metrics) = build(&OperatorConfig::default()).unwrap();
        assert_eq!(controller.queue().len(), 0);
        assert_eq!(controller.change_sources(), vec!["kubectl-watch"]);
        assert!(metrics.encode().is_ok());
    }

    #[test]
    fn watch_can_be_turned_off() {
        let cfg = OperatorConfig {
            watch: djo_model::Flag::disabled(),
            ..Default::default()
        };
        let (controller, _) = build(&cfg).unwrap();
        assert!(controller.change_sources().is_empty());
    }

    #[test]
    fn rejects_a_malformed_selector() {
        let cfg = OperatorConfig {
            pod_selector: "app=a=b".into(),
            ..Default::default()
        };
        assert!(build(&cfg).is_err());
    }
}
