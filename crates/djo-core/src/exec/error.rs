use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// The stream to the target could not be established.
    #[error("cannot open exec stream: {0}")]
    Connect(String),

    /// The remote process could not be started.
    #[error("cannot start remote process: {0}")]
    Spawn(String),

    /// The stream ended abnormally before the command completed.
    #[error("exec stream terminated abnormally: {0}")]
    Aborted(String),

    #[error("remote command exited with code {code}")]
    NonZeroExit { code: i32 },

    #[error("exec exceeded timeout of {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("exec canceled")]
    Canceled,
}

impl ExecError {
    /// Bounded label value for metrics.
    pub fn kind_label(&self) -> &'static str {
        match self {
            ExecError::Connect(_) => "connect",
            ExecError::Spawn(_) => "spawn",
            ExecError::Aborted(_) => "aborted",
            ExecError::NonZeroExit { .. } => "non_zero_exit",
            ExecError::Timeout { .. } => "timeout",
            ExecError::Canceled => "canceled",
        }
    }
}
