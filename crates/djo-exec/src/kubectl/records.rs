use async_trait::async_trait;
use tracing::debug;

use djo_core::store::{RecordStore, StoreError};
use djo_model::{DesiredStateRecord, RecordKey, RecordKind};

use crate::{
    KubectlError,
    kubectl::Kubectl,
    wire::{decode_record, decode_record_list, status_patch},
};

pub(crate) fn get_args(kind: RecordKind, key: &RecordKey) -> Vec<String> {
    vec![
        "get".into(),
        kind.resource(),
        key.name.clone(),
        "-n".into(),
        key.namespace.clone(),
        "-o".into(),
        "json".into(),
    ]
}

pub(crate) fn list_args(kind: RecordKind, namespace: Option<&str>) -> Vec<String> {
    let mut args = vec!["get".into(), kind.resource()];
    match namespace {
        Some(ns) => args.extend(["-n".into(), ns.to_string()]),
        None => args.push("--all-namespaces".into()),
    }
    args.extend(["-o".into(), "json".into()]);
    args
}

pub(crate) fn patch_status_args(kind: RecordKind, key: &RecordKey, body: &str) -> Vec<String> {
    vec![
        "patch".into(),
        kind.resource(),
        key.name.clone(),
        "-n".into(),
        key.namespace.clone(),
        "--subresource=status".into(),
        "--type=merge".into(),
        "-p".into(),
        body.to_string(),
        "-o".into(),
        "json".into(),
    ]
}

pub(crate) fn delete_args(kind: RecordKind, key: &RecordKey) -> Vec<String> {
    vec![
        "delete".into(),
        kind.resource(),
        key.name.clone(),
        "-n".into(),
        key.namespace.clone(),
        "--ignore-not-found".into(),
        "--wait=false".into(),
    ]
}

/// Desired-state records stored as custom resources.
#[derive(Debug, Clone)]
pub struct KubectlRecordStore {
    kubectl: Kubectl,
}

impl KubectlRecordStore {
    pub fn new(kubectl: Kubectl) -> Self {
        Self { kubectl }
    }
}

#[async_trait]
impl RecordStore for KubectlRecordStore {
    async fn get(
        &self,
        kind: RecordKind,
        key: &RecordKey,
    ) -> Result<Option<DesiredStateRecord>, StoreError> {
        let value = match self.kubectl.run_json(get_args(kind, key)).await {
            Ok(value) => value,
            Err(KubectlError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into_store_error(&key.to_string())),
        };
        decode_record(kind, value)
            .map(Some)
            .map_err(|e| e.into_store_error(&key.to_string()))
    }

    async fn list(
        &self,
        kind: RecordKind,
        namespace: Option<&str>,
    ) -> Result<Vec<DesiredStateRecord>, StoreError> {
        let value = self
            .kubectl
            .run_json(list_args(kind, namespace))
            .await
            .map_err(|e| e.into_store_error(kind.plural()))?;
        decode_record_list(kind, value).map_err(|e| e.into_store_error(kind.plural()))
    }

    async fn update_status(
        &self,
        record: &DesiredStateRecord,
    ) -> Result<DesiredStateRecord, StoreError> {
        let key = record.key();
        let body = status_patch(record)
            .map_err(|e| e.into_store_error(&key.to_string()))?
            .to_string();
        debug!(kind = %record.kind(), record = %key, "patching status");

        match self
            .kubectl
            .run_json(patch_status_args(record.kind(), &key, &body))
            .await
        {
            Ok(value) => decode_record(record.kind(), value).map_err(|e| e.into_store_error(&key.to_string())),
            Err(KubectlError::NotFound(reason)) => Err(StoreError::Conflict {
                key: key.to_string(),
                reason,
            }),
            Err(e) => Err(e.into_store_error(&key.to_string())),
        }
    }

    async fn delete(&self, kind: RecordKind, key: &RecordKey) -> Result<(), StoreError> {
        self.kubectl
            .run(delete_args(kind, key))
            .await
            .map(|_| ())
            .map_err(|e| e.into_store_error(&key.to_string()))
    }
}
