//! Idempotency guard.
//!
//! The completion marker is the only signal: once it is set the action is
//! never executed again for that record.
use djo_model::DesiredStateRecord;

/// Returns `true` iff the record's completion marker is set.
#[inline]
pub fn already_done(record: &DesiredStateRecord) -> bool {
    record.status.completion_marker.is_some()
}
