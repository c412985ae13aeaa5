use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

use djo_model::Flag;
use djo_observe::{LoggerFormat, LoggerLevel};

use crate::config::OperatorConfig;

/// Runs Django management tasks in the application pods on behalf of
/// DjangoMigrate, DjangoStatic, DjangoCelery and DjangoUser resources.
#[derive(Debug, Parser)]
#[command(name = "djo-operator", version)]
pub struct Cli {
    /// JSON config file; flags and env vars override its values.
    #[arg(long, env = "DJO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Namespace to watch; empty watches all namespaces.
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub namespace: Option<String>,

    /// Label selector of the application server pods (`k=v,k2=v2`).
    #[arg(long, env = "DJANGO_POD_SELECTOR")]
    pub pod_selector: Option<String>,

    /// Completed records kept per kind and namespace; 0 or less disables pruning.
    #[arg(long, env = "KEEP_CRS", allow_negative_numbers = true)]
    pub keep_records: Option<i64>,

    #[arg(long, env = "RESYNC_INTERVAL_SECS")]
    pub resync_interval_secs: Option<u64>,

    /// Delay before retrying a record whose namespace has no live pod.
    #[arg(long, env = "NOT_FOUND_REQUEUE_SECS")]
    pub not_found_requeue_secs: Option<u64>,

    #[arg(long, env = "WORKERS")]
    pub workers: Option<usize>,

    /// Watch records for changes (true/false); the periodic resync always runs.
    #[arg(long, env = "WATCH_EVENTS")]
    pub watch: Option<Flag>,

    /// Kill remote commands running longer than this.
    #[arg(long, env = "EXEC_TIMEOUT_SECS")]
    pub exec_timeout_secs: Option<u64>,

    /// Treat a non-zero remote exit status as a failure (true/false).
    #[arg(long, env = "FAIL_ON_NON_ZERO")]
    pub fail_on_non_zero: Option<Flag>,

    #[arg(long, env = "KUBECTL")]
    pub kubectl: Option<PathBuf>,

    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    #[arg(long = "context", env = "KUBE_CONTEXT")]
    pub kube_context: Option<String>,

    #[arg(long, env = "METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    /// Log filter, e.g. `info` or `djo_core=debug,info`.
    #[arg(long, env = "DJO_LOG")]
    pub log_level: Option<LoggerLevel>,

    /// Log format: text, json or journald.
    #[arg(long, env = "DJO_LOG_FORMAT")]
    pub log_format: Option<LoggerFormat>,
}

impl Cli {
    /// Load the config file, if any, then apply flag overrides.
    pub fn into_config(self) -> anyhow::Result<OperatorConfig> {
        let mut cfg = match &self.config {
            Some(path) => OperatorConfig::from_file(path)?,
            None => OperatorConfig::default(),
        };
        self.apply(&mut cfg);
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply(self, cfg: &mut OperatorConfig) {
        if let Some(ns) = self.namespace {
            cfg.namespace = Some(ns);
        }
        if let Some(v) = self.pod_selector {
            cfg.pod_selector = v;
        }
        if let Some(v) = self.keep_records {
            cfg.keep_records = v;
        }
        if let Some(v) = self.resync_interval_secs {
            cfg.resync_interval_secs = v;
        }
        if let Some(v) = self.not_found_requeue_secs {
            cfg.not_found_requeue_secs = v;
        }
        if let Some(v) = self.workers {
            cfg.workers = v;
        }
        if let Some(v) = self.watch {
            cfg.watch = v;
        }
        if let Some(v) = self.exec_timeout_secs {
            cfg.exec_timeout_secs = Some(v);
        }
        if let Some(v) = self.fail_on_non_zero {
            cfg.fail_on_non_zero = v;
        }
        if let Some(v) = self.kubectl {
            cfg.kubectl.binary = v;
        }
        if let Some(v) = self.kubeconfig {
            cfg.kubectl.kubeconfig = Some(v);
        }
        if let Some(v) = self.kube_context {
            cfg.kubectl.context = Some(v);
        }
        if let Some(v) = self.metrics_addr {
            cfg.metrics_addr = v;
        }
        if let Some(v) = self.log_level {
            cfg.logger.level = v;
        }
        if let Some(v) = self.log_format {
            cfg.logger.format = v;
        }
    }
}
