use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conflict writing {key}: {reason}")]
    Conflict { key: String, reason: String },

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("failed to decode stored object: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret {namespace}/{name} not found")]
    Missing { namespace: String, name: String },

    #[error("secret {name} missing key {key:?}")]
    MissingKey { name: String, key: String },

    #[error("secret {name} key {key:?} is not valid utf-8")]
    NotUtf8 { name: String, key: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
