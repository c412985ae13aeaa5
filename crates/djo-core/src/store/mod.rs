//! Boundary to the external collaborators: record store, pod source, secret store.
//!
//! Every operation is a single-object read or read-modify-write; there are
//! no multi-record transactions.
mod error;
pub use error::{SecretError, StoreError};

mod pod;
pub use pod::{PodInfo, PodPhase};

mod secret;
pub use secret::{SecretData, resolve_secret};

mod memory;
pub use memory::MemoryCluster;

use async_trait::async_trait;

use djo_model::{DesiredStateRecord, RecordKey, RecordKind, Selector};

/// Persistent store of desired-state records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load one record. `Ok(None)` means it no longer exists.
    async fn get(
        &self,
        kind: RecordKind,
        key: &RecordKey,
    ) -> Result<Option<DesiredStateRecord>, StoreError>;

    /// List records of `kind` in store order; `None` lists every namespace.
    async fn list(
        &self,
        kind: RecordKind,
        namespace: Option<&str>,
    ) -> Result<Vec<DesiredStateRecord>, StoreError>;

    /// Persist the status of `record` and return the stored result.
    ///
    /// Implementations reject the write with [`StoreError::Conflict`] when the
    /// record's resource version is stale.
    async fn update_status(
        &self,
        record: &DesiredStateRecord,
    ) -> Result<DesiredStateRecord, StoreError>;

    /// Delete one record. Deleting an absent record succeeds.
    async fn delete(&self, kind: RecordKind, key: &RecordKey) -> Result<(), StoreError>;
}

/// Read access to the live instances of the managed workload.
#[async_trait]
pub trait PodSource: Send + Sync {
    /// List pods in `namespace`. Implementations may filter by `selector`
    /// server-side; callers re-check it anyway.
    async fn list_pods(&self, namespace: &str, selector: &Selector)
    -> Result<Vec<PodInfo>, StoreError>;
}

/// Read access to namespaced secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Load a secret's data. `Ok(None)` means the secret does not exist.
    async fn get_secret(&self, namespace: &str, name: &str)
    -> Result<Option<SecretData>, StoreError>;
}
