mod celery;
pub use celery::CelerySpec;

mod intent;
pub use intent::IntentSpec;

mod migrate;
pub use migrate::MigrateSpec;

mod user;
pub use user::UserSpec;

use serde::{Deserialize, Deserializer, Serialize};

/// Collect static assets; carries no parameters.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectStaticSpec {}

/// Blank strings on the wire mean "unset".
pub(crate) fn blank_as_none<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(d)?;
    Ok(opt.filter(|s| !s.trim().is_empty()))
}
