use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::RecordKey;

/// Store-assigned metadata of a desired-state record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub name: String,
    pub namespace: String,
    /// Assigned by the store at creation; only used to order records for retention.
    #[serde(with = "time::serde::rfc3339")]
    pub creation_timestamp: OffsetDateTime,
    /// Opaque version used for optimistic concurrency on status writes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

impl RecordMeta {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        creation_timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            creation_timestamp,
            resource_version: None,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.namespace, &self.name)
    }
}
