use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::Value;

use djo_core::store::SecretData;

use crate::KubectlError;

#[derive(Debug, Deserialize)]
struct Secret {
    #[serde(default)]
    data: BTreeMap<String, String>,
}

/// Decode a secret object; values arrive base64 encoded.
pub fn decode_secret(value: Value) -> Result<SecretData, KubectlError> {
    let secret: Secret = serde_json::from_value(value)?;
    secret
        .data
        .into_iter()
        .map(|(key, encoded)| {
            STANDARD
                .decode(encoded.as_bytes())
                .map(|bytes| (key.clone(), bytes))
                .map_err(|e| KubectlError::Decode(format!("secret key {key:?}: {e}")))
        })
        .collect()
}
