use async_trait::async_trait;

use djo_core::store::{SecretData, SecretStore, StoreError};

use crate::{KubectlError, kubectl::Kubectl, wire::decode_secret};

/// Secrets read one at a time, never cached.
#[derive(Debug, Clone)]
pub struct KubectlSecretStore {
    kubectl: Kubectl,
}

impl KubectlSecretStore {
    pub fn new(kubectl: Kubectl) -> Self {
        Self { kubectl }
    }
}

#[async_trait]
impl SecretStore for KubectlSecretStore {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretData>, StoreError> {
        let key = format!("{namespace}/{name}");
        let args = ["get", "secret", name, "-n", namespace, "-o", "json"];
        match self.kubectl.run_json(args).await {
            Ok(value) => decode_secret(value)
                .map(Some)
                .map_err(|e| e.into_store_error(&key)),
            Err(KubectlError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into_store_error(&key)),
        }
    }
}
