use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Kind of a desired-state record: which one-shot action it declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    /// Apply database migrations.
    Migrate,
    /// Collect static assets.
    CollectStatic,
    /// Purge a queue or revoke a task.
    CeleryControl,
    /// Provision (or update) a user account.
    CreateUser,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Migrate,
        RecordKind::CollectStatic,
        RecordKind::CeleryControl,
        RecordKind::CreateUser,
    ];

    /// Short name used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Migrate => "migrate",
            RecordKind::CollectStatic => "collect-static",
            RecordKind::CeleryControl => "celery-control",
            RecordKind::CreateUser => "create-user",
        }
    }

    /// Resource kind name as stored in the cluster.
    pub fn kind_name(&self) -> &'static str {
        match self {
            RecordKind::Migrate => "DjangoMigrate",
            RecordKind::CollectStatic => "DjangoStatic",
            RecordKind::CeleryControl => "DjangoCelery",
            RecordKind::CreateUser => "DjangoUser",
        }
    }

    /// Plural resource name (without group).
    pub fn plural(&self) -> &'static str {
        match self {
            RecordKind::Migrate => "djangomigrates",
            RecordKind::CollectStatic => "djangostatics",
            RecordKind::CeleryControl => "djangoceleries",
            RecordKind::CreateUser => "djangousers",
        }
    }

    /// Fully qualified resource name, e.g. `djangomigrates.django.djangooperator`.
    pub fn resource(&self) -> String {
        format!("{}.{}", self.plural(), crate::API_GROUP)
    }

    /// Status field that carries the completion marker on the wire.
    pub fn status_field(&self) -> &'static str {
        match self {
            RecordKind::Migrate => "applied",
            RecordKind::CollectStatic => "collected",
            RecordKind::CeleryControl => "executed",
            RecordKind::CreateUser => "created",
        }
    }
}

impl FromStr for RecordKind {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        let norm = s.trim().to_ascii_lowercase();
        RecordKind::ALL
            .into_iter()
            .find(|k| {
                norm == k.as_str()
                    || norm == k.kind_name().to_ascii_lowercase()
                    || norm == k.plural()
                    || norm == k.resource()
            })
            .ok_or_else(|| ModelError::UnknownKind(s.to_string()))
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_spelling() {
        for kind in RecordKind::ALL {
            assert_eq!(kind.as_str().parse::<RecordKind>().unwrap(), kind);
            assert_eq!(kind.kind_name().parse::<RecordKind>().unwrap(), kind);
            assert_eq!(kind.plural().parse::<RecordKind>().unwrap(), kind);
            assert_eq!(kind.resource().parse::<RecordKind>().unwrap(), kind);
        }
        assert_eq!(
            "DJANGOUSER".parse::<RecordKind>().unwrap(),
            RecordKind::CreateUser
        );
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(matches!(
            "DjangoApp".parse::<RecordKind>(),
            Err(ModelError::UnknownKind(_))
        ));
    }

    #[test]
    fn status_fields_are_distinct() {
        let mut fields: Vec<_> = RecordKind::ALL.iter().map(|k| k.status_field()).collect();
        fields.sort();
        fields.dedup();
        assert_eq!(fields.len(), 4);
    }
}
