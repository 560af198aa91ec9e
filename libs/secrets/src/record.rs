//! Normalized backend records and single-value extraction

use secrecy::{ExposeSecret, SecretVec};
use serde_json::{Map, Value};
use std::fmt;

use crate::SecretsError;

/// Field names tried, in order, when no explicit field is requested.
pub const DEFAULT_FIELDS: [&str; 4] = ["value", "password", "secret", "data"];

/// Field a plain-text payload is stored under.
pub const TEXT_FIELD: &str = "value";

/// A field map read from a backend.
///
/// Keys iterate in sorted order, so "the first string field" is stable
/// across reads.
#[derive(Clone, Default)]
pub struct SecretRecord {
    fields: Map<String, Value>,
}

/// One value pulled out of a record, with the field it came from.
pub struct Extracted {
    pub field: String,
    pub value: SecretVec<u8>,
}

/// Result of a provider lookup: the value plus where it was found.
pub struct FetchedSecret {
    pub path: String,
    pub field: String,
    pub value: SecretVec<u8>,
}

impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRecord")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Debug for Extracted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extracted")
            .field("field", &self.field)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for FetchedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedSecret")
            .field("path", &self.path)
            .field("field", &self.field)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl From<Map<String, Value>> for SecretRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl SecretRecord {
    /// Build a record from a string payload: a JSON object becomes its field
    /// map, anything else is stored under [`TEXT_FIELD`].
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(fields)) => Self { fields },
            _ => {
                let mut fields = Map::new();
                fields.insert(TEXT_FIELD.to_string(), Value::String(text.to_string()));
                Self { fields }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Extract a single value.
    ///
    /// Priority: the explicit `field`, then [`DEFAULT_FIELDS`] in order, then
    /// the first string-typed value. An explicit field that is missing is an
    /// error; there is no fallback past it.
    pub fn extract(&self, field: Option<&str>) -> Result<Extracted, SecretsError> {
        if let Some(field) = field {
            return self.extract_field(field);
        }

        for name in DEFAULT_FIELDS {
            if let Some(value) = self.fields.get(name) {
                return Ok(Extracted {
                    field: name.to_string(),
                    value: render(value),
                });
            }
        }

        self.fields
            .iter()
            .find_map(|(name, value)| match value {
                Value::String(s) => Some(Extracted {
                    field: name.clone(),
                    value: SecretVec::new(s.as_bytes().to_vec()),
                }),
                _ => None,
            })
            .ok_or_else(|| SecretsError::NotFound("no suitable secret value found".to_string()))
    }

    pub fn extract_field(&self, field: &str) -> Result<Extracted, SecretsError> {
        self.fields
            .get(field)
            .map(|value| Extracted {
                field: field.to_string(),
                value: render(value),
            })
            .ok_or_else(|| SecretsError::NotFound(format!("field {field} not found in secret")))
    }
}

impl Extracted {
    pub fn into_fetched(self, path: impl Into<String>) -> FetchedSecret {
        FetchedSecret {
            path: path.into(),
            field: self.field,
            value: self.value,
        }
    }
}

impl FetchedSecret {
    pub fn bytes(&self) -> &[u8] {
        self.value.expose_secret()
    }
}

fn render(value: &Value) -> SecretVec<u8> {
    let bytes = match value {
        Value::String(s) => s.as_bytes().to_vec(),
        other => other.to_string().into_bytes(),
    };
    SecretVec::new(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> SecretRecord {
        match value {
            Value::Object(map) => SecretRecord::from(map),
            _ => unreachable!(),
        }
    }

    fn text(extracted: &Extracted) -> String {
        String::from_utf8(extracted.value.expose_secret().clone()).unwrap()
    }

    #[test]
    fn test_default_field_priority() {
        let rec = record(json!({"password": "p1", "value": "v1"}));

        let got = rec.extract(None).unwrap();
        assert_eq!(got.field, "value");
        assert_eq!(text(&got), "v1");
    }

    #[test]
    fn test_explicit_field_wins() {
        let rec = record(json!({"password": "p1", "value": "v1"}));

        let got = rec.extract(Some("password")).unwrap();
        assert_eq!(got.field, "password");
        assert_eq!(text(&got), "p1");
    }

    #[test]
    fn test_explicit_field_missing_is_error() {
        let rec = record(json!({"value": "v1"}));
        assert!(rec.extract(Some("api_key")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_debug_redacts_value() {
        let rec = record(json!({"password": "hunter2"}));
        let got = rec.extract(None).unwrap();

        let printed = format!("{got:?}");
        assert!(printed.contains("password"));
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_falls_back_to_first_string() {
        let rec = record(json!({"count": 3, "zeta": "z", "alpha": "a"}));

        let got = rec.extract(None).unwrap();
        assert_eq!(got.field, "alpha");
        assert_eq!(text(&got), "a");
    }

    #[test]
    fn test_no_string_values() {
        let rec = record(json!({"count": 3, "enabled": true}));
        assert!(rec.extract(None).is_err());
    }

    #[test]
    fn test_non_string_default_field_is_rendered() {
        let rec = record(json!({"secret": 1234}));
        assert_eq!(text(&rec.extract(None).unwrap()), "1234");
    }

    #[test]
    fn test_from_text() {
        let plain = SecretRecord::from_text("hunter2");
        assert_eq!(text(&plain.extract(None).unwrap()), "hunter2");

        let json = SecretRecord::from_text(r#"{"username":"app","password":"pw"}"#);
        let got = json.extract(None).unwrap();
        assert_eq!(got.field, "password");
        assert_eq!(text(&got), "pw");

        // A JSON scalar is not an envelope.
        let scalar = SecretRecord::from_text("42");
        assert_eq!(text(&scalar.extract(Some("value")).unwrap()), "42");
    }
}
