mod domain;
pub use domain::{API_GROUP, API_VERSION, DEFAULT_POD_SELECTOR};
pub use domain::{Flag, Labels, RecordKey, RecordMeta, SecretKeySelector, Selector};

mod error;
pub use error::{ModelError, ModelResult};

mod kind;
pub use kind::RecordKind;

mod spec;
pub use spec::{CelerySpec, CollectStaticSpec, IntentSpec, MigrateSpec, UserSpec};

mod record;
pub use record::{DesiredStateRecord, RecordStatus};
