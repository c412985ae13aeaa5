use async_trait::async_trait;

use djo_core::store::{PodInfo, PodSource, StoreError};
use djo_model::Selector;

use crate::{kubectl::Kubectl, wire::decode_pod_list};

pub(crate) fn list_pods_args(namespace: &str, selector: &Selector) -> Vec<String> {
    let mut args = vec!["get".into(), "pods".into(), "-n".into(), namespace.to_string()];
    if !selector.is_empty() {
        args.extend(["-l".into(), selector.to_string()]);
    }
    args.extend(["-o".into(), "json".into()]);
    args
}

/// Pods listed with a server-side label selector.
#[derive(Debug, Clone)]
pub struct KubectlPodSource {
    kubectl: Kubectl,
}

impl KubectlPodSource {
    pub fn new(kubectl: Kubectl) -> Self {
        Self { kubectl }
    }
}

#[async_trait]
impl PodSource for KubectlPodSource {
    async fn list_pods(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<PodInfo>, StoreError> {
        let value = self
            .kubectl
            .run_json(list_pods_args(namespace, selector))
            .await
            .map_err(|e| e.into_store_error(namespace))?;
        decode_pod_list(value).map_err(|e| e.into_store_error(namespace))
    }
}
