use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use djo_core::store::{PodInfo, PodPhase};
use djo_model::Labels;

use crate::{KubectlError, wire::List};

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: PodMeta,
    #[serde(default)]
    spec: PodSpec,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodMeta {
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    deletion_timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PodSpec {
    #[serde(default)]
    containers: Vec<Container>,
}

#[derive(Debug, Deserialize)]
struct Container {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct PodStatus {
    #[serde(default)]
    phase: Option<String>,
}

/// Decode a pod list, keeping the server's order.
pub fn decode_pod_list(value: Value) -> Result<Vec<PodInfo>, KubectlError> {
    let list: List<Pod> = serde_json::from_value(value)?;
    Ok(list
        .items
        .into_iter()
        .map(|pod| PodInfo {
            name: pod.metadata.name,
            namespace: pod.metadata.namespace,
            labels: pod.metadata.labels.into_iter().collect::<Labels>(),
            containers: pod.spec.containers.into_iter().map(|c| c.name).collect(),
            phase: pod
                .status
                .phase
                .as_deref()
                .map(PodPhase::parse)
                .unwrap_or_default(),
            terminating: pod.metadata.deletion_timestamp.is_some(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_phase_containers_and_deletion() {
        let value = json!({
            "apiVersion": "v1",
            "kind": "List",
            "items": [
                {
                    "metadata": {
                        "name": "django-7d9f-abcde",
                        "namespace": "shop",
                        "labels": { "app": "django-server", "pod-template-hash": "7d9f" }
                    },
                    "spec": { "containers": [ { "name": "django" }, { "name": "nginx" } ] },
                    "status": { "phase": "Running" }
                },
                {
                    "metadata": {
                        "name": "django-7d9f-old",
                        "namespace": "shop",
                        "deletionTimestamp": "2025-01-01T00:00:00Z"
                    },
                    "spec": { "containers": [ { "name": "django" } ] },
                    "status": { "phase": "Running" }
                },
                { "metadata": { "name": "bare" } }
            ]
        });

        let pods = decode_pod_list(value).unwrap();
        assert_eq!(pods.len(), 3);
        assert_eq!(pods[0].containers, ["django", "nginx"]);
        assert_eq!(pods[0].labels.get("app"), Some("django-server"));
        assert!(pods[0].is_live());
        assert!(pods[1].terminating);
        assert!(!pods[1].is_live());
        assert_eq!(pods[2].phase, PodPhase::Unknown);
        assert!(!pods[2].is_live());
    }
}
