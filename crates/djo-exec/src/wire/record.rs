use serde::Deserialize;
use serde_json::{Map, Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::warn;

use djo_model::{DesiredStateRecord, IntentSpec, RecordKind, RecordMeta, RecordStatus};

use crate::{KubectlError, wire::List};

#[derive(Debug, Deserialize)]
struct Object {
    metadata: RecordMeta,
    #[serde(default)]
    spec: Value,
    #[serde(default)]
    status: Value,
}

/// Decode one stored record of `kind`.
///
/// The completion marker lives in the kind's own status field; a missing,
/// `null` or empty value means "not executed yet".
pub fn decode_record(kind: RecordKind, value: Value) -> Result<DesiredStateRecord, KubectlError> {
    let obj: Object = serde_json::from_value(value)?;
    from_object(kind, obj)
}

/// Decode a list response of records of `kind`, keeping the server's order.
///
/// An item that does not decode is logged and left out: it fails its own
/// cycle on `get`, not every list of its kind. Only a malformed envelope is
/// an error.
pub fn decode_record_list(
    kind: RecordKind,
    value: Value,
) -> Result<Vec<DesiredStateRecord>, KubectlError> {
    let list: List<Value> = serde_json::from_value(value)?;
    let mut records = Vec::with_capacity(list.items.len());
    for item in list.items {
        let name = item_name(&item);
        match decode_record(kind, item) {
            Ok(record) => records.push(record),
            Err(e) => warn!(kind = %kind, record = %name, error = %e, "skipping undecodable record"),
        }
    }
    Ok(records)
}

fn item_name(item: &Value) -> String {
    let meta = &item["metadata"];
    match (meta["namespace"].as_str(), meta["name"].as_str()) {
        (Some(ns), Some(name)) => format!("{ns}/{name}"),
        (None, Some(name)) => name.to_string(),
        _ => "<unnamed>".to_string(),
    }
}

fn from_object(kind: RecordKind, obj: Object) -> Result<DesiredStateRecord, KubectlError> {
    let spec = IntentSpec::from_value(kind, obj.spec)?;
    let completion_marker = match obj.status.get(kind.status_field()) {
        Some(Value::String(s)) if !s.is_empty() => Some(
            OffsetDateTime::parse(s, &Rfc3339)
                .map_err(|e| KubectlError::Decode(format!("status.{}: {e}", kind.status_field())))?,
        ),
        Some(Value::String(_) | Value::Null) | None => None,
        Some(other) => {
            return Err(KubectlError::Decode(format!(
                "status.{} is not a timestamp: {other}",
                kind.status_field()
            )));
        }
    };
    Ok(DesiredStateRecord {
        meta: obj.metadata,
        spec,
        status: RecordStatus { completion_marker },
    })
}

/// Merge-patch body writing the completion marker of `record`.
///
/// Carries the record's resource version so the server rejects the write
/// when the record changed since it was read.
pub fn status_patch(record: &DesiredStateRecord) -> Result<Value, KubectlError> {
    let marker = match record.completed_at() {
        Some(at) => Value::String(
            at.format(&Rfc3339)
                .map_err(|e| KubectlError::Decode(e.to_string()))?,
        ),
        None => Value::Null,
    };
    let mut status = Map::new();
    status.insert(record.kind().status_field().to_string(), marker);
    let mut patch = json!({ "status": status });
    if let Some(version) = &record.meta.resource_version {
        patch["metadata"] = json!({ "resourceVersion": version });
    }
    Ok(patch)
}
