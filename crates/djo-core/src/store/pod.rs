use djo_model::Labels;

/// Lifecycle phase of a pod as reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    #[default]
    Unknown,
}

impl PodPhase {
    pub fn parse(s: &str) -> Self {
        match s {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }
}

/// Snapshot of one workload instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
    pub labels: Labels,
    /// Container names in declaration order; the first is the primary one.
    pub containers: Vec<String>,
    pub phase: PodPhase,
    /// Deletion has been requested.
    pub terminating: bool,
}

impl PodInfo {
    /// A running pod with a single container.
    pub fn running(
        namespace: impl Into<String>,
        name: impl Into<String>,
        container: impl Into<String>,
        labels: Labels,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels,
            containers: vec![container.into()],
            phase: PodPhase::Running,
            terminating: false,
        }
    }

    /// Running, not being deleted, and has a container to exec into.
    pub fn is_live(&self) -> bool {
        self.phase == PodPhase::Running && !self.terminating && !self.containers.is_empty()
    }
}
