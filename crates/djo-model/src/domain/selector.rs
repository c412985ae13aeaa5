use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Labels, error::ModelError};

/// Equality-based label selector: a set of required `key=value` pairs.
///
/// A label set matches when every required pair is present with an equal value.
/// An empty selector matches everything.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector(Labels);

impl Selector {
    pub fn new() -> Self {
        Self(Labels::new())
    }

    /// Add a required pair.
    pub fn require<K, V>(mut self, key: K, val: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.insert(key, val);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn requirements(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter()
    }

    pub fn matches(&self, labels: &Labels) -> bool {
        self.0
            .iter()
            .all(|(k, v)| labels.has(k, v))
    }
}

impl FromStr for Selector {
    type Err = ModelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut labels = Labels::new();
        for term in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let Some((key, val)) = term.split_once('=') else {
                return Err(ModelError::InvalidSelector(term.to_string()));
            };
            let key = key.trim();
            if key.is_empty() || val.contains('=') {
                return Err(ModelError::InvalidSelector(term.to_string()));
            }
            labels.insert(key, val.trim());
        }
        Ok(Self(labels))
    }
}

impl TryFrom<String> for Selector {
    type Error = ModelError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Selector> for String {
    fn from(s: Selector) -> Self {
        s.to_string()
    }
}

/// Renders as `k=v,k2=v2`, the form accepted by `kubectl -l`.
impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.0.iter() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs.iter().copied().collect()
    }

    #[test]
    fn matches_when_all_pairs_present() {
        let sel: Selector = "app=django-server,tier=web".parse().unwrap();

        assert!(sel.matches(&labels(&[
            ("app", "django-server"),
            ("tier", "web"),
            ("extra", "ignored"),
        ])));
        assert!(!sel.matches(&labels(&[("app", "django-server")])));
        assert!(!sel.matches(&labels(&[("app", "celery"), ("tier", "web")])));
    }

    #[test]
    fn empty_selector_matches_everything() {
        let sel = Selector::new();
        assert!(sel.matches(&Labels::new()));
        assert!(sel.matches(&labels(&[("a", "b")])));
    }

    #[test]
    fn rejects_malformed_terms() {
        for bad in ["app", "=x", "a=b=c", "app=web,tier"] {
            assert!(bad.parse::<Selector>().is_err(), "{bad}");
        }
    }

    #[test]
    fn display_is_sorted_and_parseable() {
        let sel = Selector::new().require("tier", "web").require("app", "django");
        assert_eq!(sel.to_string(), "app=django,tier=web");

        let back: Selector = sel.to_string().parse().unwrap();
        assert_eq!(back, sel);
    }

    #[test]
    fn deserializes_from_string() {
        let sel: Selector = serde_json::from_str(r#""app=django-server""#).unwrap();
        assert_eq!(sel.requirements().count(), 1);
    }
}
