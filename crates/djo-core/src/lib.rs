//! Reconciliation-and-execution core of the operator.
//!
//! A record flows through: guard → locator → command builder → executor →
//! completion write → retention pruning. The collaborators (record store,
//! pod source, secret store, command transport) are traits; `djo-exec`
//! provides the cluster-backed implementations and [`store::MemoryCluster`]
//! an in-process one.
pub mod controller;
pub mod error;
pub mod events;
pub mod exec;
pub mod guard;
pub mod intent;
pub mod locator;
pub mod metrics;
pub mod pruner;
pub mod reconciler;
pub mod store;

pub use error::{CoreError, ReconcileError};
pub use metrics::{MetricsBackend, MetricsHandle, ReconcileOutcome};

pub mod prelude {
    pub use crate::controller::{
        ChangeSource, ChannelSource, Controller, ControllerConfig, WorkItem, WorkQueue,
    };
    pub use crate::error::{CoreError, ReconcileError};
    pub use crate::events::{EventBus, EventReason, ReconcileEvent, Subscribe};
    pub use crate::exec::{CommandExecutor, CommandLine, ExecError, SecretValue};
    pub use crate::intent::{HandlerRouter, IntentHandler};
    pub use crate::locator::{ExecutionTarget, WorkloadLocator};
    pub use crate::pruner::{PruneReport, RetentionPolicy};
    pub use crate::reconciler::{Action, ReconcileContext, Reconciler};
    pub use crate::store::{PodInfo, PodPhase, PodSource, RecordStore, SecretStore, StoreError};
}
