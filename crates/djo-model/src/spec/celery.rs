use serde::{Deserialize, Serialize};

use super::blank_as_none;

/// Parameters of a celery control action.
///
/// `worker` takes precedence over `task`; with neither set every queue of
/// the app is purged.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CelerySpec {
    /// Celery application passed to `-A`.
    pub app: String,
    /// Queue to purge.
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub worker: Option<String>,
    /// Task id to revoke and terminate.
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub task: Option<String>,
}
