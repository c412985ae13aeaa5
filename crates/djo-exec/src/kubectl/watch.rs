use std::{process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use djo_core::controller::{ChangeSource, WorkItem, WorkQueue};
use djo_model::RecordKind;

use crate::{
    KubectlError,
    kubectl::{
        Kubectl,
        logger::{LogConfig, Stream, forward_lines},
    },
    wire::{JsonStream, WatchEvent, decode_watch_event},
};

/// Pause before re-opening a watch that ended or failed.
pub const DEFAULT_WATCH_RESTART_DELAY: Duration = Duration::from_secs(5);

pub(crate) fn watch_args(kind: RecordKind, namespace: Option<&str>) -> Vec<String> {
    let mut args = vec!["get".into(), kind.resource()];
    match namespace {
        Some(ns) => args.extend(["-n".into(), ns.to_string()]),
        None => args.push("--all-namespaces".into()),
    }
    args.extend([
        "--watch".into(),
        "--output-watch-events".into(),
        "-o".into(),
        "json".into(),
    ]);
    args
}

/// Change notifications from a long-running `kubectl get --watch`.
///
/// The server closes watches periodically; the stream is re-opened after
/// `restart_delay`. Every re-open lists existing records as `ADDED` again,
/// which the reconciler's guard absorbs.
#[derive(Debug, Clone)]
pub struct KubectlWatchSource {
    kubectl: Kubectl,
    restart_delay: Duration,
}

impl KubectlWatchSource {
    pub fn new(kubectl: Kubectl) -> Self {
        Self {
            kubectl,
            restart_delay: DEFAULT_WATCH_RESTART_DELAY,
        }
    }

    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// Run one watch stream until it ends, fails, or `shutdown` fires.
    /// Returns the number of keys queued.
    async fn watch_once(
        &self,
        kind: RecordKind,
        namespace: Option<&str>,
        queue: &WorkQueue<WorkItem>,
        shutdown: &CancellationToken,
    ) -> Result<usize, KubectlError> {
        let mut child = self
            .kubectl
            .command()
            .args(watch_args(kind, namespace))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let label = format!("watch-{}", kind.plural());
        let stderr = child.stderr.take().map(|err| {
            tokio::spawn(forward_lines(err, Stream::Stderr, label.clone(), LogConfig::default()))
        });
        let Some(mut stdout) = child.stdout.take() else {
            return Err(KubectlError::Decode("watch stdout not captured".into()));
        };

        let mut stream = JsonStream::default();
        let mut chunk = vec![0u8; 16 * 1024];
        let mut queued = 0;
        loop {
            let n = tokio::select! {
                _ = shutdown.cancelled() => {
                    let _ = child.kill().await;
                    return Ok(queued);
                }
                read = stdout.read(&mut chunk) => read?,
            };
            if n == 0 {
                break;
            }
            for value in stream.push(&chunk[..n])? {
                match decode_watch_event(value)? {
                    WatchEvent::Changed(key) => {
                        trace!(kind = %kind, record = %key, "record changed");
                        queue.add(WorkItem::new(kind, key));
                        queued += 1;
                    }
                    WatchEvent::Deleted(_) | WatchEvent::Bookmark => {}
                    WatchEvent::Error(message) => {
                        let _ = child.kill().await;
                        return Err(KubectlError::Command {
                            verb: "get --watch".into(),
                            code: None,
                            stderr: message,
                        });
                    }
                }
            }
        }

        let status = child.wait().await?;
        let stderr_tail = match stderr {
            Some(h) => h.await.ok().flatten().unwrap_or_default(),
            None => String::new(),
        };
        if status.success() {
            Ok(queued)
        } else {
            Err(KubectlError::from_failure("get --watch", status.code(), &stderr_tail))
        }
    }
}

#[async_trait]
impl ChangeSource for KubectlWatchSource {
    fn name(&self) -> &'static str {
        "kubectl-watch"
    }

    async fn watch(
        &self,
        kind: RecordKind,
        namespace: Option<String>,
        queue: WorkQueue<WorkItem>,
        shutdown: CancellationToken,
    ) {
        debug!(kind = %kind, namespace = ?namespace, "watch started");
        loop {
            match self.watch_once(kind, namespace.as_deref(), &queue, &shutdown).await {
                Ok(queued) => debug!(kind = %kind, queued, "watch stream ended"),
                Err(e) => warn!(kind = %kind, error = %e, "watch stream failed; resync still applies"),
            }
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.restart_delay) => {}
            }
        }
        debug!(kind = %kind, "watch stopped");
    }
}

#[cfg(test)]
mod tests {
    use djo_model::RecordKey;

    use super::*;
    use crate::kubectl::KubectlConfig;

    #[test]
    fn args_scope_the_watch() {
        assert_eq!(
            watch_args(RecordKind::Migrate, Some("shop")),
            [
                "get",
                "djangomigrates.django.djangooperator",
                "-n",
                "shop",
                "--watch",
                "--output-watch-events",
                "-o",
                "json"
            ]
        );
        assert!(watch_args(RecordKind::CreateUser, None).contains(&"--all-namespaces".to_string()));
    }

    #[cfg(unix)]
    fn fake_kubectl(name: &str, script: &str) -> Kubectl {
        let dir = std::env::temp_dir().join(format!(
            "djo-fake-watch-{name}-{}",
            djo_core::exec::make_exec_id("t", "x")
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("kubectl");
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        Kubectl::new(KubectlConfig {
            binary: path,
            ..Default::default()
        })
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn watch_events_enqueue_changed_records() {
        let script = r#"cat <<'JSON'
{
    "type": "ADDED",
    "object": { "metadata": { "name": "m1", "namespace": "shop" }, "spec": {} }
}
{"type": "DELETED", "object": { "metadata": { "name": "m0", "namespace": "shop" } }}
{"type": "MODIFIED", "object": { "metadata": { "name": "m2", "namespace": "shop" } }}
JSON"#;
        let source = KubectlWatchSource::new(fake_kubectl("events", script));
        let queue = WorkQueue::new();

        let queued = source
            .watch_once(RecordKind::Migrate, Some("shop"), &queue, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(queued, 2);

        let first = queue.get().await.unwrap();
        let second = queue.get().await.unwrap();
        assert_eq!(first, WorkItem::new(RecordKind::Migrate, RecordKey::new("shop", "m1")));
        assert_eq!(second, WorkItem::new(RecordKind::Migrate, RecordKey::new("shop", "m2")));
        assert!(queue.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_watch_is_reported() {
        let source = KubectlWatchSource::new(fake_kubectl(
            "fail",
            "echo 'error: the server doesn'\\''t have a resource type' >&2; exit 1",
        ));
        let err = source
            .watch_once(RecordKind::Migrate, None, &WorkQueue::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, KubectlError::Command { code: Some(1), .. }), "{err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shutdown_stops_a_blocked_watch() {
        let source = KubectlWatchSource::new(fake_kubectl("block", "exec sleep 30"))
            .with_restart_delay(Duration::from_millis(10));
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        tokio::time::timeout(
            Duration::from_secs(10),
            source.watch(RecordKind::Migrate, None, WorkQueue::new(), shutdown),
        )
        .await
        .unwrap();
    }
}
