use std::{ffi::OsStr, path::PathBuf, process::Stdio};

use serde_json::Value;
use tokio::process::Command;
use tracing::trace;

use crate::KubectlError;

/// How to reach the cluster.
#[derive(Debug, Clone)]
pub struct KubectlConfig {
    /// Path or name of the kubectl binary.
    pub binary: PathBuf,
    /// Explicit kubeconfig; `None` uses kubectl's own resolution (in-cluster
    /// service account, `$KUBECONFIG`, `~/.kube/config`).
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("kubectl"),
            kubeconfig: None,
            context: None,
        }
    }
}

/// Thin async wrapper over the kubectl binary.
#[derive(Debug, Clone, Default)]
pub struct Kubectl {
    cfg: KubectlConfig,
}

impl Kubectl {
    pub fn new(cfg: KubectlConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &KubectlConfig {
        &self.cfg
    }

    /// Connection flags prepended to every invocation.
    pub fn global_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(path) = &self.cfg.kubeconfig {
            args.push("--kubeconfig".to_string());
            args.push(path.display().to_string());
        }
        if let Some(ctx) = &self.cfg.context {
            args.push("--context".to_string());
            args.push(ctx.clone());
        }
        args
    }

    /// A command with connection flags set and stdin closed.
    ///
    /// The child is killed if the returned handle is dropped.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.cfg.binary);
        cmd.args(self.global_args());
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);
        cmd
    }

    /// Run kubectl to completion and return its stdout.
    pub async fn run<I, S>(&self, args: I) -> Result<Vec<u8>, KubectlError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        let verb = args
            .first()
            .map(|a| a.to_string_lossy().into_owned())
            .unwrap_or_default();
        trace!(verb = %verb, argc = args.len(), "running kubectl");

        let output = self
            .command()
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(KubectlError::from_failure(
                &verb,
                output.status.code(),
                &String::from_utf8_lossy(&output.stderr),
            ))
        }
    }

    /// Run kubectl and parse its stdout as JSON.
    pub async fn run_json<I, S>(&self, args: I) -> Result<Value, KubectlError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let stdout = self.run(args).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }
}
