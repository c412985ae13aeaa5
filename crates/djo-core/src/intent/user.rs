use async_trait::async_trait;

use djo_model::{DesiredStateRecord, IntentSpec, RecordKind, UserSpec};

use crate::{
    error::ReconcileError,
    exec::{CommandLine, SecretValue},
    intent::IntentHandler,
    reconciler::ReconcileContext,
    store::resolve_secret,
};

const ENV_USERNAME: &str = "DJANGO_OPERATOR_USERNAME";
const ENV_EMAIL: &str = "DJANGO_OPERATOR_EMAIL";
const ENV_SUPERUSER: &str = "DJANGO_OPERATOR_SUPERUSER";
const ENV_PASSWORD: &str = "DJANGO_OPERATOR_PASSWORD";

/// Runs inside `manage.py shell`; every input comes from the environment,
/// nothing from the record is spliced into the source.
const CREATE_USER_SCRIPT: &str = "\
import os
from django.contrib.auth import get_user_model
User = get_user_model()
superuser = os.environ['DJANGO_OPERATOR_SUPERUSER'] == 'true'
user, _ = User.objects.get_or_create(username=os.environ['DJANGO_OPERATOR_USERNAME'])
user.email = os.environ.get('DJANGO_OPERATOR_EMAIL', '')
user.is_staff = True
user.is_superuser = superuser
user.is_active = True
user.set_password(os.environ['DJANGO_OPERATOR_PASSWORD'])
user.save()
";

/// `env NAME=value... python manage.py shell -c <script>`.
///
/// The password argument is a secret: it shows up only in [`CommandLine::argv`],
/// which still puts it in the local process list while kubectl runs.
pub fn create_user_command(spec: &UserSpec, password: SecretValue) -> CommandLine {
    CommandLine::new(["env"])
        .arg(format!("{ENV_USERNAME}={}", spec.username))
        .arg(format!("{ENV_EMAIL}={}", spec.email.as_deref().unwrap_or_default()))
        .arg(format!("{ENV_SUPERUSER}={}", spec.superuser))
        .secret_arg(format!("{ENV_PASSWORD}="), password)
        .arg("python")
        .arg("manage.py")
        .arg("shell")
        .arg("-c")
        .arg(CREATE_USER_SCRIPT)
}

pub struct CreateUserHandler;

#[async_trait]
impl IntentHandler for CreateUserHandler {
    fn name(&self) -> &'static str {
        "create-user"
    }

    fn kind(&self) -> RecordKind {
        RecordKind::CreateUser
    }

    async fn build_command(
        &self,
        record: &DesiredStateRecord,
        ctx: &ReconcileContext,
    ) -> Result<CommandLine, ReconcileError> {
        let IntentSpec::CreateUser(spec) = &record.spec else {
            return Err(ReconcileError::KindMismatch {
                handler: self.name(),
                actual: record.kind(),
            });
        };
        let password = resolve_secret(
            ctx.secrets().as_ref(),
            &record.meta.namespace,
            &spec.password_secret_ref,
        )
        .await?;
        Ok(create_user_command(spec, password))
    }
}
