use thiserror::Error;

use djo_model::RecordKind;

use crate::{exec::ExecError, store::SecretError, store::StoreError};

/// Setup-time errors (wiring handlers and the controller).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("handler for kind {0} is already registered")]
    DuplicateHandler(RecordKind),

    #[error("no intent handlers registered")]
    NoHandlers,
}

/// Failure of one reconciliation cycle.
///
/// Every variant aborts the cycle without touching the completion marker;
/// the record stays pending and is retried on the next trigger.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("no handler registered for kind {0}")]
    NoHandler(RecordKind),

    #[error("handler '{handler}' cannot reconcile {actual} records")]
    KindMismatch {
        handler: &'static str,
        actual: RecordKind,
    },

    #[error("secret resolution failed: {0}")]
    Secret(#[from] SecretError),

    #[error("execution failed: {0}")]
    Exec(#[from] ExecError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Completion is already durable; only the retention pass failed.
    #[error("pruning failed after completion: {0}")]
    Prune(StoreError),
}

impl ReconcileError {
    /// Returns `true` when the cycle was aborted by cancellation rather than a failure.
    pub fn is_canceled(&self) -> bool {
        matches!(self, ReconcileError::Exec(ExecError::Canceled))
    }
}
