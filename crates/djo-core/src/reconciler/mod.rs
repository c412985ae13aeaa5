//! Per-kind reconciliation loop.
//!
//! One cycle: load → guard → locate → build → exec → completion write → prune.
//! Every failure aborts the cycle before the completion write, so the record
//! stays pending and is retried by the next trigger.
mod context;
pub use context::{DEFAULT_NOT_FOUND_REQUEUE, ReconcileContext};

use std::{
    fmt,
    time::{Duration, Instant},
};

use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use djo_model::{RecordKey, RecordKind};

use crate::{
    error::{CoreError, ReconcileError},
    events::{EventReason, ReconcileEvent},
    exec::ExecError,
    guard,
    intent::HandlerRouter,
    locator::ExecutionTarget,
    metrics::ReconcileOutcome,
    pruner,
};

/// What the trigger mechanism should do after a successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing further; the next trigger re-enters the loop.
    Done,
    /// Re-examine the record after the delay.
    RequeueAfter(Duration),
}

/// Where a record is within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Resolving,
    Executing,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Pending => "pending",
            Phase::Resolving => "resolving",
            Phase::Executing => "executing",
            Phase::Done => "done",
        })
    }
}

/// How a cycle that did not fail ended.
enum Cycle {
    Gone,
    Skipped,
    Waiting(Duration),
    Applied,
}

/// Shared reconciliation loop for every registered kind.
pub struct Reconciler {
    router: HandlerRouter,
    ctx: ReconcileContext,
}

impl Reconciler {
    pub fn new(router: HandlerRouter, ctx: ReconcileContext) -> Result<Self, CoreError> {
        if router.is_empty() {
            return Err(CoreError::NoHandlers);
        }
        Ok(Self { router, ctx })
    }

    pub fn context(&self) -> &ReconcileContext {
        &self.ctx
    }

    /// Kinds this reconciler can handle.
    pub fn kinds(&self) -> Vec<RecordKind> {
        self.router.kinds()
    }

    /// Run one reconciliation cycle for the record `key` of `kind`.
    ///
    /// `cancel` aborts an in-flight execution; an aborted cycle never writes
    /// the completion marker.
    pub async fn reconcile(
        &self,
        kind: RecordKind,
        key: &RecordKey,
        cancel: &CancellationToken,
    ) -> Result<Action, ReconcileError> {
        let started = Instant::now();
        self.ctx.metrics().record_reconcile_started(kind.as_str());

        let result = self.cycle(kind, key, cancel).await;

        let outcome = match &result {
            Ok(Cycle::Applied) => ReconcileOutcome::Applied,
            Ok(Cycle::Gone | Cycle::Skipped) => ReconcileOutcome::Skipped,
            Ok(Cycle::Waiting(_)) => ReconcileOutcome::Waiting,
            Err(e) if e.is_canceled() => ReconcileOutcome::Canceled,
            Err(_) => ReconcileOutcome::Failed,
        };
        self.ctx.metrics().record_reconcile_completed(
            kind.as_str(),
            outcome,
            started.elapsed().as_millis() as u64,
        );

        match result {
            Ok(Cycle::Waiting(delay)) => Ok(Action::RequeueAfter(delay)),
            Ok(_) => Ok(Action::Done),
            Err(e) => {
                if e.is_canceled() {
                    debug!(kind = %kind, record = %key, "reconcile canceled");
                } else {
                    warn!(kind = %kind, record = %key, error = %e, "reconcile failed");
                }
                Err(e)
            }
        }
    }

    async fn cycle(
        &self,
        kind: RecordKind,
        key: &RecordKey,
        cancel: &CancellationToken,
    ) -> Result<Cycle, ReconcileError> {
        let handler = self.router.get(kind).ok_or(ReconcileError::NoHandler(kind))?;
        if cancel.is_cancelled() {
            return Err(ExecError::Canceled.into());
        }

        let record = match self.ctx.records().get(kind, key).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(kind = %kind, record = %key, "record no longer exists");
                return Ok(Cycle::Gone);
            }
            Err(e) => return Err(self.failed(kind, key, EventReason::StoreFailed, e.into(), None).await),
        };

        if guard::already_done(&record) {
            trace!(kind = %kind, record = %key, phase = %Phase::Done, "already completed");
            self.emit(ReconcileEvent::new(kind, key.clone(), EventReason::Skipped))
                .await;
            return Ok(Cycle::Skipped);
        }

        trace!(kind = %kind, record = %key, phase = %Phase::Resolving, "locating target");
        let target = match self.ctx.locator().find(&record.meta.namespace).await {
            Ok(Some(target)) => target,
            Ok(None) => {
                let delay = self.ctx.not_found_requeue();
                info!(
                    kind = %kind,
                    record = %key,
                    phase = %Phase::Pending,
                    requeue_ms = delay.as_millis() as u64,
                    "no execution target; requeueing"
                );
                self.emit(
                    ReconcileEvent::new(kind, key.clone(), EventReason::WaitingForTarget)
                        .with_message(format!("no live pod matches {}", self.ctx.locator().selector())),
                )
                .await;
                return Ok(Cycle::Waiting(delay));
            }
            Err(e) => return Err(self.failed(kind, key, EventReason::StoreFailed, e.into(), None).await),
        };

        let command = match handler.build_command(&record, &self.ctx).await {
            Ok(command) => command,
            Err(e) => {
                let reason = match &e {
                    ReconcileError::Secret(_) => EventReason::SecretFailed,
                    _ => EventReason::StoreFailed,
                };
                return Err(self.failed(kind, key, reason, e, Some(&target)).await);
            }
        };

        info!(
            kind = %kind,
            record = %key,
            target = %target,
            phase = %Phase::Executing,
            command = %command,
            "executing command"
        );
        if let Err(e) = self.ctx.executor().exec(&target, &command, cancel).await {
            if matches!(e, ExecError::Canceled) {
                return Err(e.into());
            }
            self.ctx.metrics().record_exec_error(kind.as_str(), e.kind_label());
            return Err(self
                .failed(kind, key, EventReason::ExecFailed, e.into(), Some(&target))
                .await);
        }

        let mut record = record;
        record.mark_completed(OffsetDateTime::now_utc());
        let record = match self.ctx.records().update_status(&record).await {
            Ok(updated) => updated,
            Err(e) => {
                return Err(self
                    .failed(kind, key, EventReason::StoreFailed, e.into(), Some(&target))
                    .await);
            }
        };
        info!(kind = %kind, record = %key, phase = %Phase::Done, "completion marker written");
        self.emit(
            ReconcileEvent::new(kind, key.clone(), EventReason::Applied)
                .with_target(target.to_string())
                .with_message(command.to_string()),
        )
        .await;

        let namespace = &record.meta.namespace;
        match pruner::prune(self.ctx.records().as_ref(), kind, namespace, self.ctx.retention()).await {
            Ok(report) if !report.deleted.is_empty() => {
                self.ctx
                    .metrics()
                    .record_pruned(kind.as_str(), report.deleted.len() as u64);
                self.emit(
                    ReconcileEvent::new(kind, key.clone(), EventReason::Pruned)
                        .with_message(format!("deleted {}", report.deleted.join(", "))),
                )
                .await;
            }
            Ok(_) => {}
            Err(e) => {
                return Err(self
                    .failed(kind, key, EventReason::PruneFailed, ReconcileError::Prune(e), None)
                    .await);
            }
        }

        Ok(Cycle::Applied)
    }

    async fn emit(&self, event: ReconcileEvent) {
        self.ctx.events().publish(event).await;
    }

    /// Publish a failure event and hand the error back.
    async fn failed(
        &self,
        kind: RecordKind,
        key: &RecordKey,
        reason: EventReason,
        err: ReconcileError,
        target: Option<&ExecutionTarget>,
    ) -> ReconcileError {
        let mut event = ReconcileEvent::new(kind, key.clone(), reason).with_message(err.to_string());
        if let Some(target) = target {
            event = event.with_target(target.to_string());
        }
        self.emit(event).await;
        err
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use djo_model::{
        CelerySpec, CollectStaticSpec, Labels, MigrateSpec, SecretKeySelector, Selector, UserSpec,
    };

    use super::*;
    use crate::{
        events::{EventBus, EventCollector},
        exec::RecordingExecutor,
        intent::MigrateHandler,
        locator::WorkloadLocator,
        metrics::MetricsBackend,
        pruner::RetentionPolicy,
        store::{MemoryCluster, PodInfo, SecretError},
    };

    #[derive(Default)]
    struct CountingMetrics {
        outcomes: Mutex<Vec<(String, ReconcileOutcome)>>,
        exec_errors: Mutex<Vec<String>>,
        pruned: Mutex<u64>,
    }

    impl MetricsBackend for CountingMetrics {
        fn record_reconcile_started(&self, _: &str) {}

        fn record_reconcile_completed(&self, kind: &str, outcome: ReconcileOutcome, _: u64) {
            self.outcomes.lock().unwrap().push((kind.to_string(), outcome));
        }

        fn record_exec_error(&self, _: &str, error_kind: &str) {
            self.exec_errors.lock().unwrap().push(error_kind.to_string());
        }

        fn record_pruned(&self, _: &str, count: u64) {
            *self.pruned.lock().unwrap() += count;
        }
    }

    struct Harness {
        cluster: MemoryCluster,
        exec: RecordingExecutor,
        events: EventCollector,
        metrics: Arc<CountingMetrics>,
        reconciler: Reconciler,
    }

    impl Harness {
        fn new(keep: usize) -> Self {
            Self::with_router(keep, HandlerRouter::with_defaults())
        }

        fn with_router(keep: usize, router: HandlerRouter) -> Self {
            let cluster = MemoryCluster::new();
            let exec = RecordingExecutor::new();
            let events = EventCollector::new();
            let metrics = Arc::new(CountingMetrics::default());

            let selector: Selector = "app=django-server".parse().unwrap();
            let ctx = ReconcileContext::new(
                Arc::new(cluster.clone()),
                Arc::new(cluster.clone()),
                WorkloadLocator::new(Arc::new(cluster.clone()), selector),
                Arc::new(exec.clone()),
            )
            .with_metrics(metrics.clone())
            .with_events(EventBus::new().with_subscriber(Arc::new(events.clone())))
            .with_retention(RetentionPolicy::keep(keep));

            Self {
                reconciler: Reconciler::new(router, ctx).unwrap(),
                cluster,
                exec,
                events,
                metrics,
            }
        }

        fn add_django_pod(&self, ns: &str) {
            let labels: Labels = [("app", "django-server")].into_iter().collect();
            self.cluster
                .add_pod(PodInfo::running(ns, "django-0", "django", labels));
        }

        async fn run(&self, kind: RecordKind, ns: &str, name: &str) -> Result<Action, ReconcileError> {
            self.reconciler
                .reconcile(kind, &RecordKey::new(ns, name), &CancellationToken::new())
                .await
        }
    }

    fn migrate_spec() -> MigrateSpec {
        MigrateSpec {
            app: Some("billing".into()),
            migration: Some("0005".into()),
            fake: false,
        }
    }

    fn user_spec() -> UserSpec {
        UserSpec {
            username: "admin".into(),
            email: Some("admin@example.com".into()),
            password_secret_ref: SecretKeySelector::new("admin-pw", "password"),
            superuser: true,
        }
    }

    #[tokio::test]
    async fn pending_record_is_executed_and_marked() {
        let h = Harness::new(0);
        h.add_django_pod("shop");
        h.cluster.create("shop", "m1", migrate_spec());

        let action = h.run(RecordKind::Migrate, "shop", "m1").await.unwrap();
        assert_eq!(action, Action::Done);

        let calls = h.exec.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target.pod, "django-0");
        assert_eq!(calls[0].target.container, "django");
        assert_eq!(
            calls[0].command.argv(),
            vec!["python", "manage.py", "migrate", "--noinput", "billing", "0005"]
        );

        let stored = h
            .cluster
            .record(RecordKind::Migrate, &RecordKey::new("shop", "m1"))
            .unwrap();
        assert!(stored.completed_at().is_some());
        assert_eq!(h.events.reasons(), vec![EventReason::Applied]);
    }

    #[tokio::test]
    async fn completed_record_is_never_reexecuted() {
        let h = Harness::new(0);
        h.add_django_pod("shop");
        h.cluster.create("shop", "m1", migrate_spec());
        h.run(RecordKind::Migrate, "shop", "m1").await.unwrap();

        let key = RecordKey::new("shop", "m1");
        let marker = h.cluster.record(RecordKind::Migrate, &key).unwrap().completed_at();

        for _ in 0..3 {
            let action = h.run(RecordKind::Migrate, "shop", "m1").await.unwrap();
            assert_eq!(action, Action::Done);
        }

        assert_eq!(h.exec.call_count(), 1);
        assert_eq!(h.cluster.status_writes(), 1);
        assert_eq!(h.cluster.record(RecordKind::Migrate, &key).unwrap().completed_at(), marker);
        assert_eq!(
            h.events.reasons(),
            vec![
                EventReason::Applied,
                EventReason::Skipped,
                EventReason::Skipped,
                EventReason::Skipped
            ]
        );
    }

    #[tokio::test]
    async fn missing_target_requeues_without_side_effects() {
        let h = Harness::new(0);
        h.cluster.create("shop", "c1", CollectStaticSpec::default());

        let action = h.run(RecordKind::CollectStatic, "shop", "c1").await.unwrap();

        assert_eq!(action, Action::RequeueAfter(Duration::from_secs(10)));
        assert_eq!(h.exec.call_count(), 0);
        assert_eq!(h.cluster.status_writes(), 0);
        assert_eq!(h.events.reasons(), vec![EventReason::WaitingForTarget]);
        assert_eq!(
            h.metrics.outcomes.lock().unwrap().as_slice(),
            [("collect-static".to_string(), ReconcileOutcome::Waiting)]
        );
    }

    #[tokio::test]
    async fn target_is_looked_up_before_the_secret() {
        // No secret stored: without a pod the cycle must requeue, not fail.
        let h = Harness::new(0);
        h.cluster.create("shop", "u1", user_spec());

        let action = h.run(RecordKind::CreateUser, "shop", "u1").await.unwrap();
        assert_eq!(action, Action::RequeueAfter(DEFAULT_NOT_FOUND_REQUEUE));
    }

    #[tokio::test]
    async fn pods_in_other_namespaces_do_not_count() {
        let h = Harness::new(0);
        h.add_django_pod("blog");
        h.cluster.create("shop", "m1", migrate_spec());

        let action = h.run(RecordKind::Migrate, "shop", "m1").await.unwrap();
        assert!(matches!(action, Action::RequeueAfter(_)));
        assert_eq!(h.exec.call_count(), 0);
    }

    #[tokio::test]
    async fn exec_failure_keeps_record_pending_until_retry() {
        let h = Harness::new(0);
        h.add_django_pod("shop");
        h.cluster.create("shop", "m1", migrate_spec());
        h.exec.fail_next(ExecError::NonZeroExit { code: 1 });

        let err = h.run(RecordKind::Migrate, "shop", "m1").await.unwrap_err();
        assert!(matches!(err, ReconcileError::Exec(ExecError::NonZeroExit { code: 1 })));

        let key = RecordKey::new("shop", "m1");
        assert!(h.cluster.record(RecordKind::Migrate, &key).unwrap().completed_at().is_none());
        assert_eq!(h.events.reasons(), vec![EventReason::ExecFailed]);
        assert_eq!(h.metrics.exec_errors.lock().unwrap().len(), 1);

        h.run(RecordKind::Migrate, "shop", "m1").await.unwrap();
        assert_eq!(h.exec.call_count(), 2);
        assert!(h.cluster.record(RecordKind::Migrate, &key).unwrap().completed_at().is_some());
    }

    #[tokio::test]
    async fn cancellation_aborts_without_marker() {
        let h = Harness::new(0);
        h.add_django_pod("shop");
        h.cluster.create("shop", "m1", migrate_spec());
        h.exec.block_until_canceled();

        let cancel = CancellationToken::new();
        let key = RecordKey::new("shop", "m1");
        let (result, _) = tokio::join!(
            h.reconciler.reconcile(RecordKind::Migrate, &key, &cancel),
            async {
                tokio::task::yield_now().await;
                cancel.cancel();
            }
        );

        let err = result.unwrap_err();
        assert!(err.is_canceled());
        assert_eq!(h.exec.call_count(), 1);
        assert_eq!(h.cluster.status_writes(), 0);
        assert!(h.events.reasons().is_empty());
        assert_eq!(
            h.metrics.outcomes.lock().unwrap()[0].1,
            ReconcileOutcome::Canceled
        );
    }

    #[tokio::test]
    async fn missing_secret_fails_the_cycle() {
        let h = Harness::new(0);
        h.add_django_pod("shop");
        h.cluster.create("shop", "u1", user_spec());

        let err = h.run(RecordKind::CreateUser, "shop", "u1").await.unwrap_err();
        assert!(matches!(err, ReconcileError::Secret(SecretError::Missing { .. })));
        assert_eq!(h.exec.call_count(), 0);
        assert_eq!(h.events.reasons(), vec![EventReason::SecretFailed]);

        h.cluster.put_secret("shop", "admin-pw", [("other", "x")]);
        let err = h.run(RecordKind::CreateUser, "shop", "u1").await.unwrap_err();
        assert!(matches!(err, ReconcileError::Secret(SecretError::MissingKey { .. })));
    }

    #[tokio::test]
    async fn create_user_password_reaches_argv_only() {
        let h = Harness::new(0);
        h.add_django_pod("shop");
        h.cluster.put_secret("shop", "admin-pw", [("password", "hunter2")]);
        h.cluster.create("shop", "u1", user_spec());

        h.run(RecordKind::CreateUser, "shop", "u1").await.unwrap();

        let calls = h.exec.calls();
        assert!(calls[0].command.argv().contains(&"DJANGO_OPERATOR_PASSWORD=hunter2".to_string()));
        for event in h.events.events() {
            assert!(!event.message.unwrap_or_default().contains("hunter2"));
        }
    }

    #[tokio::test]
    async fn deleted_record_is_a_noop() {
        let h = Harness::new(0);
        h.add_django_pod("shop");

        let action = h.run(RecordKind::Migrate, "shop", "ghost").await.unwrap();
        assert_eq!(action, Action::Done);
        assert_eq!(h.exec.call_count(), 0);
        assert!(h.events.reasons().is_empty());
    }

    #[tokio::test]
    async fn completion_prunes_old_records_of_the_same_kind() {
        let h = Harness::new(2);
        h.add_django_pod("shop");
        h.cluster.put_secret("shop", "admin-pw", [("password", "pw")]);
        for name in ["u1", "u2", "u3", "u4", "u5"] {
            h.cluster.create("shop", name, user_spec());
        }
        h.cluster.create(
            "shop",
            "celery",
            CelerySpec {
                app: "billing".into(),
                worker: None,
                task: None,
            },
        );

        for name in ["u1", "u2", "u3", "u4", "u5"] {
            h.run(RecordKind::CreateUser, "shop", name).await.unwrap();
        }

        assert_eq!(h.cluster.names(RecordKind::CreateUser, "shop"), vec!["u4", "u5"]);
        assert_eq!(h.cluster.names(RecordKind::CeleryControl, "shop"), vec!["celery"]);
        assert_eq!(*h.metrics.pruned.lock().unwrap(), 3);
        assert!(h.events.reasons().contains(&EventReason::Pruned));
    }

    #[tokio::test]
    async fn prune_failure_is_reported_after_durable_completion() {
        let h = Harness::new(1);
        h.add_django_pod("shop");
        h.cluster.create("shop", "m1", migrate_spec());
        h.cluster.create("shop", "m2", migrate_spec());
        h.run(RecordKind::Migrate, "shop", "m1").await.unwrap();
        h.cluster.fail_deletes_after(0);

        let err = h.run(RecordKind::Migrate, "shop", "m2").await.unwrap_err();
        assert!(matches!(err, ReconcileError::Prune(_)));

        let key = RecordKey::new("shop", "m2");
        assert!(h.cluster.record(RecordKind::Migrate, &key).unwrap().completed_at().is_some());
        assert_eq!(h.events.reasons().last(), Some(&EventReason::PruneFailed));

        // Guard short-circuits the retry.
        h.run(RecordKind::Migrate, "shop", "m2").await.unwrap();
        assert_eq!(h.exec.call_count(), 2);
    }

    #[tokio::test]
    async fn unregistered_kind_is_a_configuration_error() {
        let mut router = HandlerRouter::new();
        router.register(Arc::new(MigrateHandler)).unwrap();
        let h = Harness::with_router(0, router);
        h.add_django_pod("shop");
        h.cluster.create("shop", "c1", CollectStaticSpec::default());

        let err = h.run(RecordKind::CollectStatic, "shop", "c1").await.unwrap_err();
        assert!(matches!(err, ReconcileError::NoHandler(RecordKind::CollectStatic)));
    }

    #[test]
    fn empty_router_is_rejected() {
        let cluster = MemoryCluster::new();
        let ctx = ReconcileContext::new(
            Arc::new(cluster.clone()),
            Arc::new(cluster.clone()),
            WorkloadLocator::new(Arc::new(cluster), Selector::default()),
            Arc::new(RecordingExecutor::new()),
        );
        assert!(matches!(
            Reconciler::new(HandlerRouter::new(), ctx),
            Err(CoreError::NoHandlers)
        ));
    }
}
