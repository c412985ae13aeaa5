use std::{process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use djo_core::{
    exec::{CommandExecutor, CommandLine, ExecError, make_exec_id},
    locator::ExecutionTarget,
};
use djo_model::Flag;

use crate::kubectl::{
    EXECUTOR_KUBECTL, Kubectl,
    logger::{LogConfig, Stream, forward_lines, remote_exit_code},
};

/// `exec -n <ns> <pod> -c <container> -- <argv...>`.
pub fn exec_args(target: &ExecutionTarget, command: &CommandLine) -> Vec<String> {
    let mut args = vec![
        "exec".to_string(),
        "-n".to_string(),
        target.namespace.clone(),
        target.pod.clone(),
        "-c".to_string(),
        target.container.clone(),
        "--".to_string(),
    ];
    args.extend(command.argv());
    args
}

enum Finished {
    Exited(std::io::Result<std::process::ExitStatus>),
    Canceled,
    TimedOut(Duration),
}

/// Runs commands in the target container through `kubectl exec`.
#[derive(Debug, Clone)]
pub struct KubectlExecutor {
    kubectl: Kubectl,
    log: LogConfig,
    timeout: Option<Duration>,
    fail_on_non_zero: Flag,
}

impl KubectlExecutor {
    /// Executor with default output forwarding, no timeout, and non-zero
    /// exit codes treated as failures.
    pub fn new(kubectl: Kubectl) -> Self {
        Self {
            kubectl,
            log: LogConfig::default(),
            timeout: None,
            fail_on_non_zero: Flag::enabled(),
        }
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Kill the stream when a command runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disabled: a remote command that ran and exited non-zero counts as
    /// success. kubectl's own failures are errors either way.
    pub fn with_fail_on_non_zero(mut self, flag: Flag) -> Self {
        self.fail_on_non_zero = flag;
        self
    }
}

#[async_trait]
impl CommandExecutor for KubectlExecutor {
    fn name(&self) -> &'static str {
        EXECUTOR_KUBECTL
    }

    async fn exec(
        &self,
        target: &ExecutionTarget,
        command: &CommandLine,
        cancel: &CancellationToken,
    ) -> Result<(), ExecError> {
        let exec_id = make_exec_id("exec", &target.pod);
        trace!(
            exec = %exec_id,
            target = %target,
            command = %command,
            timeout_ms = self.timeout.map(|t| t.as_millis() as u64),
            fail_on_non_zero = self.fail_on_non_zero.is_enabled(),
            "spawning kubectl exec",
        );

        let mut child = self
            .kubectl
            .command()
            .args(exec_args(target, command))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecError::Connect(format!("spawn kubectl: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(forward_lines(out, Stream::Stdout, exec_id.clone(), self.log)));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(forward_lines(err, Stream::Stderr, exec_id.clone(), self.log)));

        let deadline = async {
            match self.timeout {
                Some(t) => {
                    tokio::time::sleep(t).await;
                    t
                }
                None => std::future::pending().await,
            }
        };
        let finished = tokio::select! {
            res = child.wait() => Finished::Exited(res),
            _ = cancel.cancelled() => Finished::Canceled,
            t = deadline => Finished::TimedOut(t),
        };

        match &finished {
            Finished::Canceled => {
                debug!(exec = %exec_id, "cancellation requested; killing exec stream");
                kill(&mut child, &exec_id).await;
            }
            Finished::TimedOut(t) => {
                warn!(exec = %exec_id, timeout_ms = t.as_millis() as u64, "exec timed out; killing stream");
                kill(&mut child, &exec_id).await;
            }
            Finished::Exited(_) => {}
        }

        // Both pipes hit EOF once the child is gone.
        if let Some(h) = stdout {
            let _ = h.await;
        }
        let stderr_tail = match stderr {
            Some(h) => h.await.ok().flatten(),
            None => None,
        };

        let result = match finished {
            Finished::Exited(Ok(status)) => match status.code() {
                Some(0) => Ok(()),
                Some(code) => self.non_zero(&exec_id, code, stderr_tail.as_deref()),
                None => Err(ExecError::Aborted("kubectl terminated by signal".into())),
            },
            Finished::Exited(Err(e)) => Err(ExecError::Aborted(format!("wait failed: {e}"))),
            Finished::Canceled => Err(ExecError::Canceled),
            Finished::TimedOut(t) => Err(ExecError::Timeout {
                timeout_ms: t.as_millis() as u64,
            }),
        };
        debug!(exec = %exec_id, ok = result.is_ok(), "exec finished");
        result
    }
}

impl KubectlExecutor {
    /// Classify a non-zero kubectl exit.
    ///
    /// Only an exit reported by the remote process is subject to
    /// `fail_on_non_zero`; any other non-zero exit is kubectl failing to run
    /// the command at all.
    fn non_zero(&self, exec_id: &str, code: i32, stderr_tail: Option<&str>) -> Result<(), ExecError> {
        match stderr_tail.and_then(remote_exit_code) {
            Some(remote) if self.fail_on_non_zero.is_enabled() => Err(ExecError::NonZeroExit { code: remote }),
            Some(remote) => {
                warn!(exec = %exec_id, code = remote, "remote command exited non-zero; ignored");
                Ok(())
            }
            None => Err(ExecError::Connect(format!(
                "kubectl exited with code {code}: {}",
                stderr_tail.unwrap_or("no error output")
            ))),
        }
    }
}

async fn kill(child: &mut tokio::process::Child, exec_id: &str) {
    if let Err(e) = child.kill().await {
        debug!(exec = %exec_id, "failed to kill kubectl: {e}");
    }
}
