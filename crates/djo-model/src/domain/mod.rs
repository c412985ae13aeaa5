mod flag;
pub use flag::Flag;

mod labels;
pub use labels::Labels;

mod selector;
pub use selector::Selector;

mod key;
pub use key::RecordKey;

mod meta;
pub use meta::RecordMeta;

mod secret;
pub use secret::SecretKeySelector;

mod constants;
pub use constants::{API_GROUP, API_VERSION, DEFAULT_POD_SELECTOR};
