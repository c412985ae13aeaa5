use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown record kind: {0}")]
    UnknownKind(String),

    #[error("invalid selector term '{0}' (expected key=value)")]
    InvalidSelector(String),

    #[error("invalid flag value: {0}")]
    InvalidFlag(String),

    #[error("invalid {kind} spec: {reason}")]
    InvalidSpec { kind: &'static str, reason: String },

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
