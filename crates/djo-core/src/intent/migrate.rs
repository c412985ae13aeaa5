use async_trait::async_trait;

use djo_model::{DesiredStateRecord, IntentSpec, MigrateSpec, RecordKind};

use crate::{
    error::ReconcileError, exec::CommandLine, intent::IntentHandler,
    reconciler::ReconcileContext,
};

/// `python manage.py migrate --noinput [--fake] [<app> [<migration>]]`.
///
/// The migration name is only passed when an app is set.
pub fn migrate_command(spec: &MigrateSpec) -> CommandLine {
    let mut cmd = CommandLine::new(["python", "manage.py", "migrate", "--noinput"]);
    if spec.fake {
        cmd = cmd.arg("--fake");
    }
    if let Some(app) = &spec.app {
        cmd = cmd.arg(app);
        if let Some(migration) = &spec.migration {
            cmd = cmd.arg(migration);
        }
    }
    cmd
}

pub struct MigrateHandler;

#[async_trait]
impl IntentHandler for MigrateHandler {
    fn name(&self) -> &'static str {
        "migrate"
    }

    fn kind(&self) -> RecordKind {
        RecordKind::Migrate
    }

    async fn build_command(
        &self,
        record: &DesiredStateRecord,
        _ctx: &ReconcileContext,
    ) -> Result<CommandLine, ReconcileError> {
        match &record.spec {
            IntentSpec::Migrate(spec) => Ok(migrate_command(spec)),
            other => Err(ReconcileError::KindMismatch {
                handler: self.name(),
                actual: other.kind(),
            }),
        }
    }
}
