//! Untyped configuration values and dot-path access.
//!
//! Every decoded document, regardless of format, is held as a tree of
//! [`Value`] nodes. The variant set is closed: decoders map their native
//! types onto it, and everything downstream (path access, normalization,
//! indirection) pattern-matches the same eight shapes.

use std::collections::BTreeMap;
use std::fmt;

/// A decoded mapping of string keys to values.
pub type Mapping = BTreeMap<String, Value>;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null. Distinct from "key absent" — `get` reports a null
    /// value as found.
    Null,
    Bool(bool),
    /// Signed whole number. Decoder subtypes are collapsed by the
    /// normalizer, see [`crate::norm`].
    Integer(i64),
    /// Unsigned whole number beyond signed range.
    Unsigned(u64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    /// Borrow the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the mapping content, if this is a mapping.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render as a `serde_json::Value`, used for display and tests.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Unsigned(u) => serde_json::Value::from(*u),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Mapping(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Unsigned(u) => serializer.serialize_u64(*u),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => items.serialize(serializer),
            Value::Mapping(map) => map.serialize(serializer),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Unsigned(u) => write!(f, "{}", u),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

/// Resolve a dot-delimited path against a mapping.
///
/// Returns `Some` only when every intermediate segment resolves to a
/// mapping and the final segment is present — its value may be anything,
/// including an explicit null. `None` covers both a missing key and a
/// type mismatch partway down.
pub fn get_path<'a>(data: &'a Mapping, path: &str) -> Option<&'a Value> {
    let mut current = data;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let value = current.get(segment)?;

        if segments.peek().is_none() {
            return Some(value);
        }

        current = value.as_mapping()?;
    }

    None
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Unsigned(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Mapping(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<toml::Value> for Value {
    fn from(v: toml::Value) -> Self {
        match v {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            // TOML datetimes carry no counterpart in the other formats;
            // they surface as their literal text.
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            toml::Value::Table(table) => Value::Mapping(
                table.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(v: serde_yaml::Value) -> Self {
        match v {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Unsigned(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_yaml::Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .filter_map(|(k, v)| Some((yaml_key(k)?, Value::from(v))))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

/// Stringify a scalar YAML mapping key; non-scalar keys are dropped.
fn yaml_key(key: serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Mapping {
        let json = serde_json::json!({
            "server": {
                "host": "localhost",
                "port": 8080,
                "tls": null
            },
            "tags": ["a", "b"]
        });
        match Value::from(json) {
            Value::Mapping(m) => m,
            _ => panic!("fixture is a mapping"),
        }
    }

    #[test]
    fn resolves_nested_path() {
        let data = fixture();
        assert_eq!(
            get_path(&data, "server.host"),
            Some(&Value::String("localhost".to_string()))
        );
        assert_eq!(get_path(&data, "server.port"), Some(&Value::Integer(8080)));
    }

    #[test]
    fn null_is_found_missing_is_not() {
        let data = fixture();
        assert_eq!(get_path(&data, "server.tls"), Some(&Value::Null));
        assert_eq!(get_path(&data, "server.missing"), None);
        assert_eq!(get_path(&data, "missing"), None);
    }

    #[test]
    fn intermediate_non_mapping_fails_the_walk() {
        let data = fixture();
        assert_eq!(get_path(&data, "server.port.inner"), None);
        assert_eq!(get_path(&data, "tags.0"), None);
    }

    #[test]
    fn intermediate_mapping_is_not_a_terminal_hit() {
        let data = fixture();
        // "server" alone is a hit; "server" as a prefix of a longer
        // missing path is not.
        assert!(matches!(get_path(&data, "server"), Some(Value::Mapping(_))));
        assert_eq!(get_path(&data, "server.host.deeper"), None);
    }

    #[test]
    fn json_numbers_map_to_closed_kinds() {
        let v = Value::from(serde_json::json!(u64::MAX));
        assert_eq!(v, Value::Unsigned(u64::MAX));

        let v = Value::from(serde_json::json!(-5));
        assert_eq!(v, Value::Integer(-5));

        let v = Value::from(serde_json::json!(1.5));
        assert_eq!(v, Value::Float(1.5));
    }

    #[test]
    fn toml_datetime_becomes_string() {
        let table: toml::Value = "ts = 2024-01-01T00:00:00Z".parse().unwrap();
        let v = Value::from(table);
        let Value::Mapping(m) = v else {
            panic!("table decodes to a mapping")
        };
        assert!(matches!(m.get("ts"), Some(Value::String(_))));
    }

    #[test]
    fn values_serialize_like_their_json_rendering() {
        let data = Value::Mapping(fixture());
        let direct = serde_json::to_string(&data).unwrap();
        let via_json = serde_json::to_string(&data.to_json()).unwrap();
        assert_eq!(direct, via_json);
    }

    #[test]
    fn yaml_scalar_keys_are_stringified() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("1: one\ntrue: yes").unwrap();
        let Value::Mapping(m) = Value::from(yaml) else {
            panic!("mapping")
        };
        assert!(m.contains_key("1"));
        assert!(m.contains_key("true"));
    }
}
