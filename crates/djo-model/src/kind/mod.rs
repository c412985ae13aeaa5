mod record_kind;
pub use record_kind::RecordKind;
