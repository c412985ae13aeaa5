//! Per-kind command construction.
//!
//! Each kind contributes a pure builder (`*_command`) and an
//! [`IntentHandler`] that plugs the builder into the shared reconciler.
mod router;
pub use router::{HandlerRouter, register_default_handlers};

mod celery;
pub use celery::{CeleryHandler, celery_command};

mod collect_static;
pub use collect_static::{CollectStaticHandler, collect_static_command};

mod migrate;
pub use migrate::{MigrateHandler, migrate_command};

mod user;
pub use user::{CreateUserHandler, create_user_command};

use async_trait::async_trait;

use djo_model::{DesiredStateRecord, RecordKind};

use crate::{error::ReconcileError, exec::CommandLine, reconciler::ReconcileContext};

/// Reconciliation logic specific to one record kind.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    /// Handler name used in logs.
    fn name(&self) -> &'static str;

    /// The kind this handler reconciles.
    fn kind(&self) -> RecordKind;

    /// Build the command for a pending record.
    ///
    /// Runs after a target has been found; may read collaborators through `ctx`
    /// (e.g. secrets) but must not mutate anything.
    async fn build_command(
        &self,
        record: &DesiredStateRecord,
        ctx: &ReconcileContext,
    ) -> Result<CommandLine, ReconcileError>;
}
