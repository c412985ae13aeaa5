//! Remote command execution contract.
//!
//! Transports implement [`CommandExecutor`]; the core never depends on how
//! the stream into the target container is established.
mod error;
pub use error::ExecError;

mod command;
pub use command::{Arg, CommandLine, SecretValue};

mod id;
pub use id::make_exec_id;

mod recording;
pub use recording::{ExecCall, RecordingExecutor};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::locator::ExecutionTarget;

/// Runs a command inside the primary container of an execution target.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Transport name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Run `command` to completion with stdin closed.
    ///
    /// Output is forwarded to the operator's own logs and never interpreted.
    /// Must return [`ExecError::Canceled`] promptly once `cancel` fires.
    async fn exec(
        &self,
        target: &ExecutionTarget,
        command: &CommandLine,
        cancel: &CancellationToken,
    ) -> Result<(), ExecError>;
}
