use std::{
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use djo_core::{controller::DEFAULT_RESYNC_INTERVAL, reconciler::DEFAULT_NOT_FOUND_REQUEUE};
use djo_exec::kubectl::KubectlConfig;
use djo_model::{DEFAULT_POD_SELECTOR, Flag, Selector};
use djo_observe::LoggerConfig;

/// Operator settings. Every key is optional in the JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    /// Watched namespace; unset watches all namespaces.
    pub namespace: Option<String>,
    /// Labels of the application server pods.
    pub pod_selector: String,
    /// Completed records kept per kind and namespace; `<= 0` disables pruning.
    pub keep_records: i64,
    pub resync_interval_secs: u64,
    pub not_found_requeue_secs: u64,
    pub workers: usize,
    /// React to record changes through a kubectl watch; resync runs either way.
    pub watch: Flag,
    /// Per-command limit for remote execution; unset means no limit.
    pub exec_timeout_secs: Option<u64>,
    /// Treat a non-zero remote exit status as a failure.
    pub fail_on_non_zero: Flag,
    pub kubectl: KubectlSection,
    /// Bind address of the metrics and health endpoints.
    pub metrics_addr: SocketAddr,
    pub logger: LoggerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KubectlSection {
    pub binary: PathBuf,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

impl Default for KubectlSection {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("kubectl"),
            kubeconfig: None,
            context: None,
        }
    }
}

impl From<&KubectlSection> for KubectlConfig {
    fn from(s: &KubectlSection) -> Self {
        KubectlConfig {
            binary: s.binary.clone(),
            kubeconfig: s.kubeconfig.clone(),
            context: s.context.clone(),
        }
    }
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            pod_selector: DEFAULT_POD_SELECTOR.to_string(),
            keep_records: 0,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL.as_secs(),
            not_found_requeue_secs: DEFAULT_NOT_FOUND_REQUEUE.as_secs(),
            workers: 4,
            watch: Flag::enabled(),
            exec_timeout_secs: None,
            fail_on_non_zero: Flag::enabled(),
            kubectl: KubectlSection::default(),
            metrics_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            logger: LoggerConfig::default(),
        }
    }
}

impl OperatorConfig {
    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Reject settings the operator cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        if self.resync_interval_secs == 0 {
            bail!("resync interval must be at least 1s");
        }
        if self.exec_timeout_secs == Some(0) {
            bail!("exec timeout must be at least 1s when set");
        }
        self.selector()?;
        Ok(())
    }

    pub fn selector(&self) -> anyhow::Result<Selector> {
        self.pod_selector
            .parse()
            .with_context(|| format!("invalid pod selector {:?}", self.pod_selector))
    }

    /// Watched namespace; an empty value means all namespaces.
    pub fn watched_namespace(&self) -> Option<String> {
        self.namespace
            .as_deref()
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .map(str::to_string)
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    pub fn not_found_requeue(&self) -> Duration {
        Duration::from_secs(self.not_found_requeue_secs)
    }

    pub fn exec_timeout(&self) -> Option<Duration> {
        self.exec_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let cfg = OperatorConfig::default();
        assert_eq!(cfg.pod_selector, "app=django-server");
        assert_eq!(cfg.resync_interval(), Duration::from_secs(30));
        assert_eq!(cfg.not_found_requeue(), Duration::from_secs(10));
        assert_eq!(cfg.keep_records, 0);
        assert!(cfg.fail_on_non_zero.is_enabled());
        assert!(cfg.watch.is_enabled());
        assert!(cfg.exec_timeout().is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: OperatorConfig = serde_json::from_str(
            r#"{"namespace": "shop", "keep_records": 3, "kubectl": {"context": "prod"}, "logger": {"format": "json"}}"#,
        )
        .unwrap();

        assert_eq!(cfg.watched_namespace().as_deref(), Some("shop"));
        assert_eq!(cfg.keep_records, 3);
        assert_eq!(cfg.kubectl.context.as_deref(), Some("prod"));
        assert_eq!(cfg.kubectl.binary, PathBuf::from("kubectl"));
        assert_eq!(cfg.workers, 4);
    }

    #[test]
    fn blank_namespace_watches_everything() {
        let cfg = OperatorConfig {
            namespace: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(cfg.watched_namespace(), None);
    }

    #[test]
    fn validate_rejects_unusable_settings() {
        let bad = [
            OperatorConfig { workers: 0, ..Default::default() },
            OperatorConfig { resync_interval_secs: 0, ..Default::default() },
            OperatorConfig { exec_timeout_secs: Some(0), ..Default::default() },
            OperatorConfig { pod_selector: "app".into(), ..Default::default() },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn from_file_reports_the_path() {
        let err = OperatorConfig::from_file(Path::new("/nonexistent/djo.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/djo.json"));
    }
}
