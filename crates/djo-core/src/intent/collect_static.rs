use async_trait::async_trait;

use djo_model::{DesiredStateRecord, IntentSpec, RecordKind};

use crate::{
    error::ReconcileError, exec::CommandLine, intent::IntentHandler,
    reconciler::ReconcileContext,
};

pub fn collect_static_command() -> CommandLine {
    CommandLine::new(["python", "manage.py", "collectstatic", "--noinput"])
}

pub struct CollectStaticHandler;

#[async_trait]
impl IntentHandler for CollectStaticHandler {
    fn name(&self) -> &'static str {
        "collect-static"
    }

    fn kind(&self) -> RecordKind {
        RecordKind::CollectStatic
    }

    async fn build_command(
        &self,
        record: &DesiredStateRecord,
        _ctx: &ReconcileContext,
    ) -> Result<CommandLine, ReconcileError> {
        match &record.spec {
            IntentSpec::CollectStatic(_) => Ok(collect_static_command()),
            other => Err(ReconcileError::KindMismatch {
                handler: self.name(),
                actual: other.kind(),
            }),
        }
    }
}
