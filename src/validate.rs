//! Structural validation of versioned records.
//!
//! A record is any serde value whose serialized shape is a map with a textual
//! `Version` entry. Rust field names are snake_case, so the serialized name
//! `version` (any ASCII case) counts as the same field; an exact `Version`
//! key takes precedence.

use crate::error::{Error, Result, ValidationError};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// Canonical name of the version field.
pub const VERSION_FIELD: &str = "Version";

/// Types that carry a schema version.
///
/// Implement this for config structs used with [`crate::ConfigStore`].
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use vconfig::Versioned;
///
/// #[derive(Serialize, Deserialize)]
/// struct AppConfig {
///     version: String,
///     name: String,
/// }
///
/// impl Versioned for AppConfig {
///     fn version(&self) -> &str {
///         &self.version
///     }
/// }
/// ```
pub trait Versioned {
    fn version(&self) -> &str;
}

impl<T: Versioned + ?Sized> Versioned for &T {
    fn version(&self) -> &str {
        (**self).version()
    }
}

impl<T: Versioned + ?Sized> Versioned for Box<T> {
    fn version(&self) -> &str {
        (**self).version()
    }
}

/// Check that `record` serializes to a map with a textual `Version` field.
///
/// References are transparent: `validate(&config)` and `validate(&&config)`
/// inspect the same value.
///
/// # Errors
///
/// Returns the unmet condition, or [`ValidationError::Unserializable`] if
/// the value cannot be serialized at all.
pub fn validate<T: Serialize + ?Sized>(record: &T) -> std::result::Result<(), ValidationError> {
    let value = serde_json::to_value(record).map_err(|err| ValidationError::Unserializable {
        message: err.to_string(),
    })?;
    validate_value(&value)
}

/// Structural check on an already-serialized document.
pub fn validate_value(value: &Value) -> std::result::Result<(), ValidationError> {
    version_of(value).map(|_| ())
}

/// Validate `record` and return its version.
pub(crate) fn record_version<T: Serialize + ?Sized>(record: &T) -> Result<String> {
    let value = serde_json::to_value(record).map_err(Error::encode)?;
    match version_of(&value) {
        Ok(version) => Ok(version.to_owned()),
        Err(err) => {
            warn!(error = %err, "record failed structural validation");
            Err(err.into())
        }
    }
}

fn version_of(value: &Value) -> std::result::Result<&str, ValidationError> {
    let Value::Object(fields) = value else {
        return Err(ValidationError::NotARecord {
            found: value_kind(value),
        });
    };

    match find_version_field(fields) {
        None => Err(ValidationError::MissingVersionField),
        Some(Value::String(version)) => Ok(version),
        Some(other) => Err(ValidationError::WrongVersionFieldType {
            found: value_kind(other),
        }),
    }
}

/// Look up the version entry: exact `Version` first, then any ASCII casing.
/// The map is key-ordered, so the smallest differently cased key wins.
pub(crate) fn find_version_field(fields: &Map<String, Value>) -> Option<&Value> {
    fields.get(VERSION_FIELD).or_else(|| {
        fields
            .iter()
            .find(|(key, _)| is_version_key(key))
            .map(|(_, value)| value)
    })
}

pub(crate) fn is_version_key(key: &str) -> bool {
    key.eq_ignore_ascii_case(VERSION_FIELD)
}

/// Human-readable name for the shape of a value.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct WithVersion {
        version: String,
        roots: Vec<String>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct PascalVersion {
        version: String,
        app_name: String,
    }

    #[derive(Serialize)]
    struct NoVersion {
        name: String,
        port: u16,
    }

    #[derive(Serialize)]
    struct NumericVersion {
        version: u32,
    }

    #[derive(Serialize)]
    struct NestedVersion {
        version: BTreeMap<String, String>,
    }

    fn kind_of(result: std::result::Result<(), ValidationError>) -> ErrorKind {
        result.unwrap_err().kind()
    }

    #[test]
    fn test_accepts_snake_case_version() {
        let record = WithVersion {
            version: "1".to_string(),
            roots: vec!["a".to_string()],
        };
        assert!(validate(&record).is_ok());
    }

    #[test]
    fn test_accepts_pascal_case_version() {
        let record = PascalVersion {
            version: "1".to_string(),
            app_name: "demo".to_string(),
        };
        assert!(validate(&record).is_ok());
    }

    #[test]
    fn test_sees_through_references() {
        let record = WithVersion {
            version: "1".to_string(),
            roots: Vec::new(),
        };
        let by_ref = &record;
        assert!(validate(&by_ref).is_ok());
        assert!(validate(&Box::new(by_ref)).is_ok());
    }

    #[test]
    fn test_rejects_primitives_and_collections() {
        assert_eq!(kind_of(validate(&42u32)), ErrorKind::NotARecord);
        assert_eq!(kind_of(validate("1")), ErrorKind::NotARecord);
        assert_eq!(kind_of(validate(&vec!["1"])), ErrorKind::NotARecord);
        assert_eq!(kind_of(validate(&Option::<u8>::None)), ErrorKind::NotARecord);
        assert_eq!(kind_of(validate(&())), ErrorKind::NotARecord);
    }

    #[test]
    fn test_rejects_missing_version() {
        let record = NoVersion {
            name: "test".to_string(),
            port: 8080,
        };
        assert_eq!(kind_of(validate(&record)), ErrorKind::MissingVersionField);
    }

    #[test]
    fn test_rejects_numeric_version() {
        let err = validate(&NumericVersion { version: 1 }).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongVersionFieldType);
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn test_rejects_nested_version() {
        let record = NestedVersion {
            version: BTreeMap::new(),
        };
        assert_eq!(kind_of(validate(&record)), ErrorKind::WrongVersionFieldType);
    }

    #[test]
    fn test_unserializable_value() {
        let mut record = BTreeMap::new();
        record.insert(vec![1u8], "1".to_string());

        let err = validate(&record).unwrap_err();
        assert!(matches!(err, ValidationError::Unserializable { .. }));
        assert_eq!(err.kind(), ErrorKind::EncodeError);
        assert_eq!(
            record_version(&record).unwrap_err().kind(),
            ErrorKind::EncodeError
        );
    }

    #[test]
    fn test_exact_key_wins_over_folded_key() {
        let doc = json!({"version": 2, "Version": "2"});
        assert!(validate_value(&doc).is_ok());
    }

    #[test]
    fn test_not_a_record_names_found_shape() {
        let err = validate_value(&json!([1, 2])).unwrap_err();
        assert_eq!(err, ValidationError::NotARecord { found: "sequence" });
        assert!(err.to_string().contains("sequence"));
    }

    #[test]
    fn test_versioned_through_box() {
        struct Fixed;
        impl Versioned for Fixed {
            fn version(&self) -> &str {
                "3"
            }
        }
        let boxed: Box<Fixed> = Box::new(Fixed);
        assert_eq!(boxed.version(), "3");
        assert_eq!((&Fixed).version(), "3");
    }
}
