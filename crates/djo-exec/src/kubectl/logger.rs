use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};

/// Forwarding of remote output into the operator's logs.
#[derive(Debug, Clone, Copy)]
pub struct LogConfig {
    /// Max line length before truncation.
    pub max_line_length: usize,
    /// Log stdout at INFO level (false = DEBUG).
    pub stdout_info: bool,
    /// Log stderr at WARN level (false = DEBUG).
    pub stderr_warn: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_line_length: 4096,
            stdout_info: true,
            stderr_warn: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn as_str(&self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

/// Log every line of `reader` until EOF and return the last non-blank line.
///
/// Remote output is never interpreted; the last stderr line only matters for
/// kubectl's own exit report (see [`remote_exit_code`]).
pub(crate) async fn forward_lines<R>(
    reader: R,
    stream: Stream,
    exec_id: String,
    cfg: LogConfig,
) -> Option<String>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut last = None;
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = truncate(&line, cfg.max_line_length);
                let elevated = match stream {
                    Stream::Stdout => cfg.stdout_info,
                    Stream::Stderr => cfg.stderr_warn,
                };
                match (stream, elevated) {
                    (Stream::Stdout, true) => info!(exec = %exec_id, stream = stream.as_str(), "{line}"),
                    (Stream::Stderr, true) => warn!(exec = %exec_id, stream = stream.as_str(), "{line}"),
                    _ => debug!(exec = %exec_id, stream = stream.as_str(), "{line}"),
                }
                if !line.trim().is_empty() {
                    last = Some(line.trim().to_string());
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!(exec = %exec_id, stream = stream.as_str(), error = %e, "output stream closed");
                break;
            }
        }
    }
    last
}

/// Exit code of the remote process, parsed from kubectl's stderr report
/// `command terminated with exit code N`.
///
/// kubectl exits non-zero for its own failures too (unreachable API server,
/// failed upgrade, pod gone); those never carry this line.
pub(crate) fn remote_exit_code(stderr_tail: &str) -> Option<i32> {
    stderr_tail
        .trim()
        .strip_prefix("command terminated with exit code ")?
        .trim()
        .parse()
        .ok()
}

/// Cut `line` to at most `max` bytes on a char boundary.
pub(crate) fn truncate(line: &str, max: usize) -> &str {
    if line.len() <= max {
        return line;
    }
    let mut end = max;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        // 'é' is two bytes; cutting inside it backs off.
        assert_eq!(truncate("héllo", 2), "h");
    }

    #[tokio::test]
    async fn forwarding_drains_the_reader_and_keeps_the_last_line() {
        let input: &[u8] = b"Operations to perform:\n  Apply all migrations: billing\n\n";
        let last = forward_lines(input, Stream::Stdout, "exec-1".into(), LogConfig::default()).await;
        assert_eq!(last.as_deref(), Some("Apply all migrations: billing"));
    }

    #[test]
    fn remote_exit_is_told_apart_from_kubectl_errors() {
        assert_eq!(remote_exit_code("command terminated with exit code 2"), Some(2));
        assert_eq!(remote_exit_code("  command terminated with exit code 137 "), Some(137));
        assert_eq!(
            remote_exit_code("error: unable to upgrade connection: pod does not exist"),
            None
        );
        assert_eq!(remote_exit_code("command terminated with exit code x"), None);
    }
}
