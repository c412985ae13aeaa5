use std::collections::BTreeMap;

use djo_model::SecretKeySelector;

use crate::{
    exec::SecretValue,
    store::{SecretError, SecretStore},
};

/// Raw secret data: key → bytes.
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// Dereference `selector` against the secret store.
///
/// A missing secret, a missing key, or non-UTF-8 bytes are all hard errors.
pub async fn resolve_secret(
    store: &dyn SecretStore,
    namespace: &str,
    selector: &SecretKeySelector,
) -> Result<SecretValue, SecretError> {
    let data = store
        .get_secret(namespace, &selector.name)
        .await?
        .ok_or_else(|| SecretError::Missing {
            namespace: namespace.to_string(),
            name: selector.name.clone(),
        })?;

    let raw = data
        .get(&selector.key)
        .ok_or_else(|| SecretError::MissingKey {
            name: selector.name.clone(),
            key: selector.key.clone(),
        })?;

    let value = String::from_utf8(raw.clone()).map_err(|_| SecretError::NotUtf8 {
        name: selector.name.clone(),
        key: selector.key.clone(),
    })?;
    Ok(SecretValue::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCluster;

    #[tokio::test]
    async fn resolves_existing_key() {
        let cluster = MemoryCluster::new();
        cluster.put_secret("shop", "admin-pw", [("password", "s3cret")]);

        let value = resolve_secret(
            &cluster,
            "shop",
            &SecretKeySelector::new("admin-pw", "password"),
        )
        .await
        .unwrap();
        assert_eq!(value.expose(), "s3cret");
    }

    #[tokio::test]
    async fn missing_secret_and_missing_key_are_distinct_errors() {
        let cluster = MemoryCluster::new();
        cluster.put_secret("shop", "admin-pw", [("password", "s3cret")]);

        let err = resolve_secret(&cluster, "shop", &SecretKeySelector::new("nope", "password"))
            .await
            .unwrap_err();
        assert!(matches!(err, SecretError::Missing { .. }), "{err:?}");

        let err = resolve_secret(&cluster, "shop", &SecretKeySelector::new("admin-pw", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, SecretError::MissingKey { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn secrets_are_namespaced() {
        let cluster = MemoryCluster::new();
        cluster.put_secret("other", "admin-pw", [("password", "s3cret")]);

        let err = resolve_secret(
            &cluster,
            "shop",
            &SecretKeySelector::new("admin-pw", "password"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SecretError::Missing { .. }));
    }
}
