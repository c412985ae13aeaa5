use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{IntentSpec, RecordKey, RecordKind, RecordMeta};

/// Observed outcome of a record.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStatus {
    /// When the action ran. `None` means not executed yet.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completion_marker: Option<OffsetDateTime>,
}

/// A declared one-shot action plus the observed outcome of that action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredStateRecord {
    pub meta: RecordMeta,
    pub spec: IntentSpec,
    pub status: RecordStatus,
}

impl DesiredStateRecord {
    /// A fresh, not yet executed record.
    pub fn new(meta: RecordMeta, spec: impl Into<IntentSpec>) -> Self {
        Self {
            meta,
            spec: spec.into(),
            status: RecordStatus::default(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.spec.kind()
    }

    pub fn key(&self) -> RecordKey {
        self.meta.key()
    }

    pub fn completed_at(&self) -> Option<OffsetDateTime> {
        self.status.completion_marker
    }

    /// Set the completion marker.
    ///
    /// The marker only ever goes from unset to set: returns `false` and leaves
    /// the record untouched when it is already set.
    pub fn mark_completed(&mut self, at: OffsetDateTime) -> bool {
        if self.status.completion_marker.is_some() {
            return false;
        }
        self.status.completion_marker = Some(at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MigrateSpec;

    fn ts(secs: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(secs).unwrap()
    }

    #[test]
    fn marker_is_written_once() {
        let meta = RecordMeta::new("shop", "m1", ts(0));
        let mut rec = DesiredStateRecord::new(meta, MigrateSpec::default());
        assert_eq!(rec.kind(), RecordKind::Migrate);
        assert!(rec.completed_at().is_none());

        assert!(rec.mark_completed(ts(10)));
        assert!(!rec.mark_completed(ts(20)));
        assert_eq!(rec.completed_at(), Some(ts(10)));
    }

    #[test]
    fn status_serializes_marker_as_rfc3339() {
        let status = RecordStatus {
            completion_marker: Some(ts(0)),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"completionMarker":"1970-01-01T00:00:00Z"}"#);

        let empty: RecordStatus = serde_json::from_str("{}").unwrap();
        assert!(empty.completion_marker.is_none());
    }
}
