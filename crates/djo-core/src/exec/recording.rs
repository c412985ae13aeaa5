use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    exec::{CommandExecutor, CommandLine, ExecError},
    locator::ExecutionTarget,
};

/// One observed call to [`RecordingExecutor::exec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCall {
    pub target: ExecutionTarget,
    pub command: CommandLine,
}

/// Executor that records calls instead of running them.
///
/// Scripted failures are returned in order; in blocking mode every call
/// waits for cancellation.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    inner: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    calls: Vec<ExecCall>,
    failures: VecDeque<ExecError>,
    block: bool,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the next call fail with `err`.
    pub fn fail_next(&self, err: ExecError) {
        self.script().failures.push_back(err);
    }

    /// Make every call block until its cancellation token fires.
    pub fn block_until_canceled(&self) {
        self.script().block = true;
    }

    pub fn calls(&self) -> Vec<ExecCall> {
        self.script().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script().calls.len()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn exec(
        &self,
        target: &ExecutionTarget,
        command: &CommandLine,
        cancel: &CancellationToken,
    ) -> Result<(), ExecError> {
        let (block, failure) = {
            let mut script = self.script();
            script.calls.push(ExecCall {
                target: target.clone(),
                command: command.clone(),
            });
            (script.block, script.failures.pop_front())
        };

        if block {
            cancel.cancelled().await;
            return Err(ExecError::Canceled);
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
