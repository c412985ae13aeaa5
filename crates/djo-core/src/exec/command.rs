use std::fmt;

/// A credential that must never reach logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value, for the transport only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

/// One argument of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Plain(String),
    /// Rendered as `prefix` followed by the secret; logged as `prefix***`.
    Secret { prefix: String, value: SecretValue },
}

impl Arg {
    fn raw(&self) -> String {
        match self {
            Arg::Plain(s) => s.clone(),
            Arg::Secret { prefix, value } => format!("{prefix}{}", value.expose()),
        }
    }

    fn redacted(&self) -> String {
        match self {
            Arg::Plain(s) => s.clone(),
            Arg::Secret { prefix, .. } => format!("{prefix}***"),
        }
    }
}

/// Argument vector handed to the remote process.
///
/// Arguments are passed as-is, never through a shell, so no quoting or
/// interpolation happens on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    args: Vec<Arg>,
}

impl CommandLine {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(|s| Arg::Plain(s.into())).collect(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Plain(arg.into()));
        self
    }

    pub fn secret_arg(mut self, prefix: impl Into<String>, value: SecretValue) -> Self {
        self.args.push(Arg::Secret {
            prefix: prefix.into(),
            value,
        });
        self
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Raw argv for the transport.
    pub fn argv(&self) -> Vec<String> {
        self.args.iter().map(Arg::raw).collect()
    }

    /// Argv with secrets masked.
    pub fn redacted(&self) -> Vec<String> {
        self.args.iter().map(Arg::redacted).collect()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_masked_everywhere_but_argv() {
        let cmd = CommandLine::new(["env"])
            .secret_arg("PW=", SecretValue::new("hunter2"))
            .arg("true");

        assert_eq!(cmd.argv(), vec!["env", "PW=hunter2", "true"]);
        assert_eq!(cmd.redacted(), vec!["env", "PW=***", "true"]);
        assert_eq!(cmd.to_string(), "env PW=*** true");
        assert!(!format!("{cmd:?}").contains("hunter2"));
    }
}
