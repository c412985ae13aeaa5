use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};

use djo_model::{DesiredStateRecord, IntentSpec, RecordKey, RecordKind, RecordMeta, Selector};

use crate::store::{PodInfo, PodSource, RecordStore, SecretData, SecretStore, StoreError};

/// First creation timestamp handed out by [`MemoryCluster::create`].
const EPOCH_SECS: i64 = 1_735_689_600;

/// In-process cluster: records, pods and secrets behind one lock.
///
/// Behaves like the real store where it matters to the core: store-assigned
/// creation timestamps, resource versions checked on status writes, and list
/// results in insertion order. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct MemoryCluster {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    records: Vec<DesiredStateRecord>,
    pods: Vec<PodInfo>,
    secrets: BTreeMap<(String, String), SecretData>,
    next_version: u64,
    created: i64,
    deletes_left: Option<usize>,
    status_writes: usize,
}

impl State {
    fn bump(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }

    fn position(&self, kind: RecordKind, key: &RecordKey) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.kind() == kind && r.meta.namespace == key.namespace && r.meta.name == key.name)
    }
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a pending record; each call gets a strictly later creation timestamp.
    pub fn create(
        &self,
        namespace: &str,
        name: &str,
        spec: impl Into<IntentSpec>,
    ) -> DesiredStateRecord {
        let at = {
            let mut st = self.state();
            st.created += 1;
            OffsetDateTime::UNIX_EPOCH + Duration::seconds(EPOCH_SECS + st.created)
        };
        self.create_at(namespace, name, spec, at)
    }

    /// Create a pending record with an explicit creation timestamp.
    pub fn create_at(
        &self,
        namespace: &str,
        name: &str,
        spec: impl Into<IntentSpec>,
        creation: OffsetDateTime,
    ) -> DesiredStateRecord {
        self.insert(DesiredStateRecord::new(
            RecordMeta::new(namespace, name, creation),
            spec,
        ))
    }

    /// Store `record` as-is (status included), replacing any record with the same identity.
    pub fn insert(&self, mut record: DesiredStateRecord) -> DesiredStateRecord {
        let mut st = self.state();
        record.meta.resource_version = Some(st.bump());
        match st.position(record.kind(), &record.key()) {
            Some(idx) => st.records[idx] = record.clone(),
            None => st.records.push(record.clone()),
        }
        record
    }

    /// Snapshot of one record.
    pub fn record(&self, kind: RecordKind, key: &RecordKey) -> Option<DesiredStateRecord> {
        let st = self.state();
        st.position(kind, key).map(|idx| st.records[idx].clone())
    }

    /// Names of the records of `kind` in `namespace`, in store order.
    pub fn names(&self, kind: RecordKind, namespace: &str) -> Vec<String> {
        self.state()
            .records
            .iter()
            .filter(|r| r.kind() == kind && r.meta.namespace == namespace)
            .map(|r| r.meta.name.clone())
            .collect()
    }

    pub fn add_pod(&self, pod: PodInfo) {
        self.state().pods.push(pod);
    }

    pub fn clear_pods(&self) {
        self.state().pods.clear();
    }

    pub fn put_secret<I, K, V>(&self, namespace: &str, name: &str, data: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let data = data.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.state()
            .secrets
            .insert((namespace.to_string(), name.to_string()), data);
    }

    /// Let the next `n` deletions succeed and fail every one after that.
    pub fn fail_deletes_after(&self, n: usize) {
        self.state().deletes_left = Some(n);
    }

    /// Number of accepted status writes.
    pub fn status_writes(&self) -> usize {
        self.state().status_writes
    }
}

#[async_trait]
impl RecordStore for MemoryCluster {
    async fn get(
        &self,
        kind: RecordKind,
        key: &RecordKey,
    ) -> Result<Option<DesiredStateRecord>, StoreError> {
        Ok(self.record(kind, key))
    }

    async fn list(
        &self,
        kind: RecordKind,
        namespace: Option<&str>,
    ) -> Result<Vec<DesiredStateRecord>, StoreError> {
        Ok(self
            .state()
            .records
            .iter()
            .filter(|r| r.kind() == kind)
            .filter(|r| namespace.is_none_or(|ns| r.meta.namespace == ns))
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        record: &DesiredStateRecord,
    ) -> Result<DesiredStateRecord, StoreError> {
        let mut st = self.state();
        let key = record.key();
        let Some(idx) = st.position(record.kind(), &key) else {
            return Err(StoreError::Conflict {
                key: key.to_string(),
                reason: "record no longer exists".into(),
            });
        };
        let stored_version = st.records[idx].meta.resource_version.clone();
        if record.meta.resource_version.is_some() && record.meta.resource_version != stored_version {
            return Err(StoreError::Conflict {
                key: key.to_string(),
                reason: format!(
                    "stale resource version {:?} (stored {:?})",
                    record.meta.resource_version, stored_version
                ),
            });
        }

        let version = st.bump();
        let stored = &mut st.records[idx];
        stored.status = record.status.clone();
        stored.meta.resource_version = Some(version);
        let updated = stored.clone();
        st.status_writes += 1;
        Ok(updated)
    }

    async fn delete(&self, kind: RecordKind, key: &RecordKey) -> Result<(), StoreError> {
        let mut st = self.state();
        if let Some(left) = st.deletes_left.as_mut() {
            if *left == 0 {
                return Err(StoreError::Backend(format!("injected delete failure for {key}")));
            }
            *left -= 1;
        }
        if let Some(idx) = st.position(kind, key) {
            st.records.remove(idx);
        }
        Ok(())
    }
}

#[async_trait]
impl PodSource for MemoryCluster {
    async fn list_pods(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<PodInfo>, StoreError> {
        Ok(self
            .state()
            .pods
            .iter()
            .filter(|p| p.namespace == namespace && selector.matches(&p.labels))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SecretStore for MemoryCluster {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretData>, StoreError> {
        Ok(self
            .state()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}
