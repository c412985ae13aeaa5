//! Collaborators backed by the `kubectl` binary.
//!
//! Every call spawns one `kubectl` process via `tokio::process::Command`;
//! nothing is cached between calls.
mod client;
pub use client::{Kubectl, KubectlConfig};

mod logger;
pub use logger::LogConfig;

mod executor;
pub use executor::{KubectlExecutor, exec_args};

mod records;
pub use records::KubectlRecordStore;

mod pods;
pub use pods::KubectlPodSource;

mod secrets;
pub use secrets::KubectlSecretStore;

mod watch;
pub use watch::{DEFAULT_WATCH_RESTART_DELAY, KubectlWatchSource};

/// Executor name used in logs and metric labels.
pub const EXECUTOR_KUBECTL: &str = "kubectl";
