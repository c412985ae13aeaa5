use serde::Deserialize;
use serde_json::Value;

use djo_model::RecordKey;

use crate::KubectlError;

/// Event of `kubectl get --watch --output-watch-events -o json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Object created, updated, or listed when the watch starts.
    Changed(RecordKey),
    Deleted(RecordKey),
    /// Progress marker without an object change.
    Bookmark,
    /// The server ended the watch, e.g. with an expired resource version.
    Error(String),
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    object: Value,
}

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    name: String,
    #[serde(default)]
    namespace: String,
}

/// Decode one watch event. Only the object's identity is read, so records
/// whose spec does not decode still trigger their own reconcile.
pub fn decode_watch_event(value: Value) -> Result<WatchEvent, KubectlError> {
    let raw: RawEvent = serde_json::from_value(value)?;
    let key = || -> Result<RecordKey, KubectlError> {
        let meta: ObjectMeta = serde_json::from_value(raw.object["metadata"].clone())?;
        Ok(RecordKey::new(meta.namespace, meta.name))
    };
    match raw.kind.as_str() {
        "ADDED" | "MODIFIED" => Ok(WatchEvent::Changed(key()?)),
        "DELETED" => Ok(WatchEvent::Deleted(key()?)),
        "BOOKMARK" => Ok(WatchEvent::Bookmark),
        "ERROR" => Ok(WatchEvent::Error(
            raw.object["message"].as_str().unwrap_or("watch error").to_string(),
        )),
        other => Err(KubectlError::Decode(format!("unknown watch event type {other:?}"))),
    }
}

/// Splits a byte stream of concatenated JSON documents, as printed by
/// `kubectl --watch -o json`, into values.
#[derive(Debug, Default)]
pub struct JsonStream {
    buf: Vec<u8>,
}

impl JsonStream {
    /// Feed `bytes` and return every document completed by them.
    ///
    /// A syntax error discards the buffered input.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<Value>, KubectlError> {
        self.buf.extend_from_slice(bytes);

        let (values, consumed, failure) = {
            let mut values = Vec::new();
            let mut iter = serde_json::Deserializer::from_slice(&self.buf).into_iter::<Value>();
            let mut consumed = 0;
            let mut failure = None;
            loop {
                match iter.next() {
                    Some(Ok(v)) => {
                        values.push(v);
                        consumed = iter.byte_offset();
                    }
                    // Partial document: wait for more bytes.
                    Some(Err(e)) if e.is_eof() => break,
                    Some(Err(e)) => {
                        failure = Some(e);
                        break;
                    }
                    None => {
                        consumed = iter.byte_offset();
                        break;
                    }
                }
            }
            (values, consumed, failure)
        };

        if let Some(e) = failure {
            self.buf.clear();
            return Err(e.into());
        }
        self.buf.drain(..consumed);
        Ok(values)
    }

    /// Bytes of an incomplete document still buffered.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
