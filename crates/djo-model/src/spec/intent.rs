use serde_json::Value;

use crate::{
    RecordKind,
    error::{ModelError, ModelResult},
    spec::{CelerySpec, CollectStaticSpec, MigrateSpec, UserSpec},
};

/// Declared intent of a record: one case per [`RecordKind`], each with its own payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentSpec {
    Migrate(MigrateSpec),
    CollectStatic(CollectStaticSpec),
    CeleryControl(CelerySpec),
    CreateUser(UserSpec),
}

impl IntentSpec {
    pub fn kind(&self) -> RecordKind {
        match self {
            IntentSpec::Migrate(_) => RecordKind::Migrate,
            IntentSpec::CollectStatic(_) => RecordKind::CollectStatic,
            IntentSpec::CeleryControl(_) => RecordKind::CeleryControl,
            IntentSpec::CreateUser(_) => RecordKind::CreateUser,
        }
    }

    /// Decode the `spec` object of a stored record of the given kind.
    ///
    /// A missing (`null`) spec decodes as an empty object.
    pub fn from_value(kind: RecordKind, value: Value) -> ModelResult<Self> {
        let value = match value {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        let invalid = |e: serde_json::Error| ModelError::InvalidSpec {
            kind: kind.kind_name(),
            reason: e.to_string(),
        };
        Ok(match kind {
            RecordKind::Migrate => IntentSpec::Migrate(serde_json::from_value(value).map_err(invalid)?),
            RecordKind::CollectStatic => {
                IntentSpec::CollectStatic(serde_json::from_value(value).map_err(invalid)?)
            }
            RecordKind::CeleryControl => {
                IntentSpec::CeleryControl(serde_json::from_value(value).map_err(invalid)?)
            }
            RecordKind::CreateUser => {
                IntentSpec::CreateUser(serde_json::from_value(value).map_err(invalid)?)
            }
        })
    }

    /// Encode the payload as the `spec` object of a stored record.
    pub fn to_value(&self) -> ModelResult<Value> {
        let res = match self {
            IntentSpec::Migrate(s) => serde_json::to_value(s),
            IntentSpec::CollectStatic(s) => serde_json::to_value(s),
            IntentSpec::CeleryControl(s) => serde_json::to_value(s),
            IntentSpec::CreateUser(s) => serde_json::to_value(s),
        };
        res.map_err(|e| ModelError::Invalid(e.to_string()))
    }
}

impl From<MigrateSpec> for IntentSpec {
    fn from(s: MigrateSpec) -> Self {
        IntentSpec::Migrate(s)
    }
}

impl From<CollectStaticSpec> for IntentSpec {
    fn from(s: CollectStaticSpec) -> Self {
        IntentSpec::CollectStatic(s)
    }
}

impl From<CelerySpec> for IntentSpec {
    fn from(s: CelerySpec) -> Self {
        IntentSpec::CeleryControl(s)
    }
}

impl From<UserSpec> for IntentSpec {
    fn from(s: UserSpec) -> Self {
        IntentSpec::CreateUser(s)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_migrate_and_normalizes_blank_strings() {
        let spec = IntentSpec::from_value(
            RecordKind::Migrate,
            json!({"app": "billing", "migration": "", "fake": true}),
        )
        .unwrap();

        assert_eq!(
            spec,
            IntentSpec::Migrate(MigrateSpec {
                app: Some("billing".into()),
                migration: None,
                fake: true,
            })
        );
    }

    #[test]
    fn decodes_null_spec_for_collect_static() {
        let spec = IntentSpec::from_value(RecordKind::CollectStatic, Value::Null).unwrap();
        assert_eq!(spec.kind(), RecordKind::CollectStatic);
    }

    #[test]
    fn decodes_user_with_secret_ref() {
        let spec = IntentSpec::from_value(
            RecordKind::CreateUser,
            json!({
                "username": "admin",
                "email": "admin@example.com",
                "passwordSecretRef": {"name": "admin-pw", "key": "password"},
                "superuser": true
            }),
        )
        .unwrap();

        let IntentSpec::CreateUser(user) = spec else {
            panic!("expected CreateUser, got {spec:?}");
        };
        assert_eq!(user.password_secret_ref.name, "admin-pw");
        assert_eq!(user.password_secret_ref.key, "password");
        assert!(user.superuser);
    }

    #[test]
    fn missing_required_field_is_invalid_spec() {
        let err = IntentSpec::from_value(RecordKind::CreateUser, json!({"username": "x"}))
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidSpec { kind: "DjangoUser", .. }));
    }

    #[test]
    fn to_value_omits_unset_options() {
        let spec = IntentSpec::CeleryControl(CelerySpec {
            app: "billing".into(),
            worker: None,
            task: Some("abc123".into()),
        });
        assert_eq!(
            spec.to_value().unwrap(),
            json!({"app": "billing", "task": "abc123"})
        );
    }
}
