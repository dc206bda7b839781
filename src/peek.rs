//! Version peeking without decoding the full record.
//!
//! The probe walks the top-level map once. Every entry other than the version
//! field is skipped with [`IgnoredAny`], so nested structures are never
//! materialized and no caller shape is needed.

use crate::error::ValidationError;
use crate::validate::{VERSION_FIELD, is_version_key, value_kind};
use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_json::Value;
use std::fmt;

/// Version entries found at the top level of a stored record.
///
/// Selection matches [`crate::validate::find_version_field`] on the decoded
/// map: a repeated key keeps its last value, and among differently cased
/// keys the smallest by byte order wins.
#[derive(Debug, Default)]
pub(crate) struct VersionProbe {
    exact: Option<Value>,
    folded: Option<(String, Value)>,
}

impl VersionProbe {
    /// The textual version, preferring an exact `Version` key.
    pub(crate) fn into_version(self) -> Result<String, ValidationError> {
        match self.exact.or(self.folded.map(|(_, value)| value)) {
            None => Err(ValidationError::MissingVersionField),
            Some(Value::String(version)) => Ok(version),
            Some(other) => Err(ValidationError::WrongVersionFieldType {
                found: value_kind(&other),
            }),
        }
    }
}

impl VersionProbe {
    fn takes_folded(&self, key: &str) -> bool {
        match &self.folded {
            None => true,
            Some((current, _)) => key <= current.as_str(),
        }
    }
}

impl<'de> Deserialize<'de> for VersionProbe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ProbeVisitor)
    }
}

struct ProbeVisitor;

impl<'de> Visitor<'de> for ProbeVisitor {
    type Value = VersionProbe;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a record with a `{}` field", VERSION_FIELD)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<VersionProbe, A::Error> {
        let mut probe = VersionProbe::default();
        while let Some(key) = map.next_key::<ProbeKey>()? {
            match key {
                ProbeKey::Exact => probe.exact = Some(map.next_value()?),
                ProbeKey::Folded(key) if probe.takes_folded(&key) => {
                    probe.folded = Some((key, map.next_value()?));
                }
                ProbeKey::Folded(_) | ProbeKey::Other => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(probe)
    }
}

/// Classification of a top-level key. Non-string keys (YAML allows them)
/// are never the version field.
enum ProbeKey {
    Exact,
    Folded(String),
    Other,
}

impl ProbeKey {
    fn classify(key: &str) -> Self {
        if key == VERSION_FIELD {
            ProbeKey::Exact
        } else if is_version_key(key) {
            ProbeKey::Folded(key.to_owned())
        } else {
            ProbeKey::Other
        }
    }
}

impl<'de> Deserialize<'de> for ProbeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(KeyVisitor)
    }
}

struct KeyVisitor;

impl<'de> Visitor<'de> for KeyVisitor {
    type Value = ProbeKey;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map key")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ProbeKey, E> {
        Ok(ProbeKey::classify(v))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<ProbeKey, E> {
        Ok(ProbeKey::Other)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<ProbeKey, E> {
        Ok(ProbeKey::Other)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<ProbeKey, E> {
        Ok(ProbeKey::Other)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<ProbeKey, E> {
        Ok(ProbeKey::Other)
    }

    fn visit_unit<E: de::Error>(self) -> Result<ProbeKey, E> {
        Ok(ProbeKey::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    fn peek_json(text: &str) -> Result<String, String> {
        let probe: VersionProbe = Format::Json.decode(text).map_err(|e| e.to_string())?;
        probe.into_version().map_err(|e| e.to_string())
    }

    fn peek_yaml(text: &str) -> Result<String, String> {
        let probe: VersionProbe = Format::Yaml.decode(text).map_err(|e| e.to_string())?;
        probe.into_version().map_err(|e| e.to_string())
    }

    #[test]
    fn test_peek_ignores_other_fields() {
        let text = r#"{
            "nested": {"deep": [1, 2, {"Version": "inner"}]},
            "Version": "2",
            "paths": ["a", "b"]
        }"#;
        assert_eq!(peek_json(text).unwrap(), "2");
    }

    #[test]
    fn test_peek_lowercase_key() {
        assert_eq!(peek_json(r#"{"version": "1", "roots": []}"#).unwrap(), "1");
    }

    #[test]
    fn test_peek_prefers_exact_key() {
        assert_eq!(
            peek_json(r#"{"version": "old", "Version": "new"}"#).unwrap(),
            "new"
        );
    }

    #[test]
    fn test_peek_repeated_key_keeps_last_value() {
        assert_eq!(
            peek_json(r#"{"version": "1", "version": "2"}"#).unwrap(),
            "2"
        );
    }

    #[test]
    fn test_peek_case_variants_pick_smallest_key() {
        // "VERSION" sorts before "version"
        let err = peek_json(r#"{"version": "1", "VERSION": 2}"#).unwrap_err();
        assert!(err.contains("must be a string"));
        assert_eq!(
            peek_json(r#"{"VERSION": "a", "vErSiOn": "b", "version": "c"}"#).unwrap(),
            "a"
        );
    }

    #[test]
    fn test_peek_agrees_with_decoded_map() {
        for text in [
            r#"{"version": "1", "version": "2"}"#,
            r#"{"version": "1", "VERSION": 2}"#,
            r#"{"verSion": "x", "Version": "y", "VERSION": "z"}"#,
            r#"{"vERSION": "p", "VeRsIoN": "q"}"#,
        ] {
            let doc: Value = serde_json::from_str(text).unwrap();
            let from_map = crate::validate::validate_value(&doc).map(|()| {
                crate::validate::find_version_field(doc.as_object().unwrap())
                    .and_then(Value::as_str)
                    .unwrap()
                    .to_string()
            });
            let from_probe: VersionProbe = Format::Json.decode(text).unwrap();
            assert_eq!(from_probe.into_version(), from_map, "document: {}", text);
        }
    }

    #[test]
    fn test_peek_missing_version() {
        let err = peek_json(r#"{"name": "x"}"#).unwrap_err();
        assert!(err.contains("no `Version` field"));
    }

    #[test]
    fn test_peek_numeric_version() {
        let err = peek_json(r#"{"Version": 2}"#).unwrap_err();
        assert!(err.contains("must be a string"));
    }

    #[test]
    fn test_peek_top_level_array_is_decode_error() {
        let err = peek_json("[1, 2, 3]").unwrap_err();
        assert!(err.contains("a record with a `Version` field"));
    }

    #[test]
    fn test_peek_yaml_with_non_string_keys() {
        let text = "1: one\ntrue: yes\nversion: '3'\nitems:\n  - a\n";
        assert_eq!(peek_yaml(text).unwrap(), "3");
    }
}
