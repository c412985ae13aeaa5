use serde::{Deserialize, Serialize};

use super::blank_as_none;

/// Parameters of a migration run.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateSpec {
    /// Application label to migrate; all apps when unset.
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub app: Option<String>,
    /// Target migration name; only meaningful together with `app`.
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub migration: Option<String>,
    /// Mark migrations as applied without running them.
    #[serde(default)]
    pub fake: bool,
}
