//! JSON shapes of the stored objects, as returned by `kubectl -o json`.
mod record;
pub use record::{decode_record, decode_record_list, status_patch};

mod pod;
pub use pod::decode_pod_list;

mod secret;
pub use secret::decode_secret;

mod watch;
pub use watch::{JsonStream, WatchEvent, decode_watch_event};

use serde::Deserialize;

/// `{ "items": [...] }` envelope of list responses.
#[derive(Debug, Deserialize)]
struct List<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}
