use std::sync::atomic::{AtomicU64, Ordering};

/// Per-process sequence for exec identifiers.
static EXEC_SEQ: AtomicU64 = AtomicU64::new(1);

/// Build an id that correlates the log lines of one command execution.
///
/// Format: `{kind}-{name}-{seq:x}`.
pub fn make_exec_id(kind: &str, name: &str) -> String {
    let seq = EXEC_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{kind}-{name}-{seq:x}")
}

#[cfg(test)]
mod tests {
    use super::make_exec_id;

    #[test]
    fn ids_are_unique_and_prefixed() {
        let a = make_exec_id("migrate", "m1");
        let b = make_exec_id("migrate", "m1");
        assert!(a.starts_with("migrate-m1-"));
        assert_ne!(a, b);
    }
}
