use serde::{Deserialize, Serialize};

use super::blank_as_none;
use crate::SecretKeySelector;

/// Parameters of a user provisioning action.
///
/// The password never lives in the record: it is resolved from
/// `password_secret_ref` at reconciliation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSpec {
    pub username: String,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    pub password_secret_ref: SecretKeySelector,
    #[serde(default)]
    pub superuser: bool,
}
