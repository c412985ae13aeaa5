use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::{LoggerFormat, LoggerLevel, LoggerTimeZone};

/// Logger configuration; every field is optional in config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` expression, e.g. `"info"` or `"djo_core=debug,info"`.
    pub level: LoggerLevel,
    /// Timezone of the timestamps.
    pub tz: LoggerTimeZone,
    /// Include module targets in log lines.
    pub with_targets: bool,
    /// Colored text output; only honored when stdout is a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            tz: LoggerTimeZone::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = LoggerConfig::default();
        assert_eq!(cfg.format, LoggerFormat::Text);
        assert_eq!(cfg.tz, LoggerTimeZone::Utc);
        assert_eq!(cfg.level.as_str(), "info");
        assert!(cfg.with_targets);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: LoggerConfig = serde_json::from_str(r#"{"format": "json", "level": "djo_core=debug,info"}"#).unwrap();
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert_eq!(cfg.level.as_str(), "djo_core=debug,info");
        assert_eq!(cfg.tz, LoggerTimeZone::Utc);
        assert!(cfg.use_color);
    }

    #[test]
    fn invalid_values_are_rejected_at_parse_time() {
        assert!(serde_json::from_str::<LoggerConfig>(r#"{"level": "djo_core=loud"}"#).is_err());
        assert!(serde_json::from_str::<LoggerConfig>(r#"{"tz": "mars"}"#).is_err());
    }
}
