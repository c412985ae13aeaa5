use thiserror::Error;

use djo_core::store::StoreError;
use djo_model::ModelError;

#[derive(Debug, Error)]
pub enum KubectlError {
    #[error("failed to run kubectl: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("kubectl {verb} exited with {code:?}: {stderr}")]
    Command {
        verb: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("cannot decode kubectl output: {0}")]
    Decode(String),
}

impl KubectlError {
    /// Classify a failed kubectl invocation by its stderr.
    pub fn from_failure(verb: &str, code: Option<i32>, stderr: &str) -> Self {
        let stderr = stderr.trim();
        if stderr.contains("(NotFound)") {
            KubectlError::NotFound(stderr.to_string())
        } else if stderr.contains("(Conflict)") || stderr.contains("the object has been modified") {
            KubectlError::Conflict(stderr.to_string())
        } else {
            KubectlError::Command {
                verb: verb.to_string(),
                code,
                stderr: stderr.to_string(),
            }
        }
    }

    /// Map onto the store taxonomy; `key` names the object for conflicts.
    pub fn into_store_error(self, key: &str) -> StoreError {
        match self {
            KubectlError::Conflict(reason) => StoreError::Conflict {
                key: key.to_string(),
                reason,
            },
            KubectlError::Decode(reason) => StoreError::Decode(reason),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for KubectlError {
    fn from(e: serde_json::Error) -> Self {
        KubectlError::Decode(e.to_string())
    }
}

impl From<ModelError> for KubectlError {
    fn from(e: ModelError) -> Self {
        KubectlError::Decode(e.to_string())
    }
}
