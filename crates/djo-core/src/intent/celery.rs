use async_trait::async_trait;

use djo_model::{CelerySpec, DesiredStateRecord, IntentSpec, RecordKind};

use crate::{
    error::ReconcileError, exec::CommandLine, intent::IntentHandler,
    reconciler::ReconcileContext,
};

/// `celery -A <app>` followed by, in order of precedence:
/// - `purge -f -Q <worker>` when a worker queue is set;
/// - `control revoke <task> --terminate --signal=SIGKILL` when a task id is set;
/// - `purge -f` otherwise.
pub fn celery_command(spec: &CelerySpec) -> CommandLine {
    let cmd = CommandLine::new(["celery", "-A"]).arg(&spec.app);
    match (&spec.worker, &spec.task) {
        (Some(worker), _) => cmd.arg("purge").arg("-f").arg("-Q").arg(worker),
        (None, Some(task)) => cmd
            .arg("control")
            .arg("revoke")
            .arg(task)
            .arg("--terminate")
            .arg("--signal=SIGKILL"),
        (None, None) => cmd.arg("purge").arg("-f"),
    }
}

pub struct CeleryHandler;

#[async_trait]
impl IntentHandler for CeleryHandler {
    fn name(&self) -> &'static str {
        "celery-control"
    }

    fn kind(&self) -> RecordKind {
        RecordKind::CeleryControl
    }

    async fn build_command(
        &self,
        record: &DesiredStateRecord,
        _ctx: &ReconcileContext,
    ) -> Result<CommandLine, ReconcileError> {
        match &record.spec {
            IntentSpec::CeleryControl(spec) => Ok(celery_command(spec)),
            other => Err(ReconcileError::KindMismatch {
                handler: self.name(),
                actual: other.kind(),
            }),
        }
    }
}
