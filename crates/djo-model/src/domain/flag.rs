use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Boolean switch used by configuration toggles.
///
/// Parses the usual spellings found in env vars and config files
/// (`true/false`, `yes/no`, `on/off`, `1/0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flag(bool);

impl Flag {
    pub const fn enabled() -> Self {
        Self(true)
    }

    pub const fn disabled() -> Self {
        Self(false)
    }

    pub const fn is_enabled(&self) -> bool {
        self.0
    }

    pub const fn is_disabled(&self) -> bool {
        !self.0
    }
}

/// Flags are opt-out: a missing value means enabled.
impl Default for Flag {
    fn default() -> Self {
        Self::enabled()
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        Self(b)
    }
}

impl From<Flag> for bool {
    fn from(f: Flag) -> Self {
        f.0
    }
}

impl FromStr for Flag {
    type Err = ModelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" | "enabled" => Ok(Self::enabled()),
            "false" | "no" | "off" | "0" | "disabled" => Ok(Self::disabled()),
            _ => Err(ModelError::InvalidFlag(s.to_string())),
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "enabled" } else { "disabled" })
    }
}

#[cfg(test)]
mod tests {
    use super::Flag;

    #[test]
    fn default_is_enabled() {
        assert!(Flag::default().is_enabled());
    }

    #[test]
    fn parses_common_spellings() {
        for s in ["true", "YES", " on ", "1", "Enabled"] {
            assert!(s.parse::<Flag>().unwrap().is_enabled(), "{s}");
        }
        for s in ["false", "No", "off", "0", "disabled"] {
            assert!(s.parse::<Flag>().unwrap().is_disabled(), "{s}");
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!("maybe".parse::<Flag>().is_err());
        assert!("".parse::<Flag>().is_err());
    }

    #[test]
    fn serializes_as_plain_bool() {
        let json = serde_json::to_string(&Flag::disabled()).unwrap();
        assert_eq!(json, "false");

        let back: Flag = serde_json::from_str("true").unwrap();
        assert!(back.is_enabled());
    }
}
