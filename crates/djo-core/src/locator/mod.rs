//! Workload locator: resolves one live execution target per cycle.
use std::{fmt, sync::Arc};

use tracing::{debug, trace};

use djo_model::Selector;

use crate::store::{PodSource, StoreError};

/// Live instance chosen for one command execution; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionTarget {
    pub pod: String,
    pub namespace: String,
    /// Primary (first) container of the pod.
    pub container: String,
}

impl fmt::Display for ExecutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.namespace, self.pod, self.container)
    }
}

/// Finds a live pod of the managed workload by label selector.
#[derive(Clone)]
pub struct WorkloadLocator {
    source: Arc<dyn PodSource>,
    selector: Selector,
}

impl WorkloadLocator {
    pub fn new(source: Arc<dyn PodSource>, selector: Selector) -> Self {
        Self { source, selector }
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Resolve a target in `namespace`.
    ///
    /// `Ok(None)` is the expected "not yet available" answer, not an error.
    /// With several candidates the first in the source's order wins; that
    /// order is not guaranteed to be stable across calls.
    pub async fn find(&self, namespace: &str) -> Result<Option<ExecutionTarget>, StoreError> {
        let pods = self.source.list_pods(namespace, &self.selector).await?;
        trace!(namespace, selector = %self.selector, candidates = pods.len(), "listed pods");

        let target = pods
            .into_iter()
            .filter(|p| self.selector.matches(&p.labels))
            .find(|p| p.is_live())
            .map(|p| ExecutionTarget {
                container: p.containers[0].clone(),
                pod: p.name,
                namespace: p.namespace,
            });

        match &target {
            Some(t) => debug!(target = %t, "execution target resolved"),
            None => debug!(namespace, selector = %self.selector, "no live pod matches"),
        }
        Ok(target)
    }
}
