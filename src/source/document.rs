//! Decoded document sources.
//!
//! One instance wraps one decoded file. The three formats share the lookup
//! path; only decoding differs, and decoding happens exactly once before
//! the source joins the cascade.

use crate::error::SourceError;
use crate::source::Source;
use crate::value::{self, Mapping, Value};
use async_trait::async_trait;

/// A read-only decoded document.
pub struct DocumentSource {
    data: Mapping,
}

impl DocumentSource {
    /// Wrap an already-decoded mapping.
    pub fn new(data: Mapping) -> Self {
        Self { data }
    }

    /// Decode a JSON document. The top level must be an object.
    pub fn from_json(content: &str) -> Result<Self, String> {
        let parsed: serde_json::Value =
            serde_json::from_str(content).map_err(|e| e.to_string())?;
        Self::from_value(Value::from(parsed))
    }

    /// Decode a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        let parsed: toml::Value = content.parse().map_err(|e: toml::de::Error| e.to_string())?;
        Self::from_value(Value::from(parsed))
    }

    /// Decode a YAML document. An empty document decodes to an empty
    /// mapping rather than an error.
    pub fn from_yaml(content: &str) -> Result<Self, String> {
        let parsed: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        if matches!(parsed, serde_yaml::Value::Null) {
            return Ok(Self::new(Mapping::new()));
        }
        Self::from_value(Value::from(parsed))
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Mapping(data) => Ok(Self { data }),
            other => Err(format!(
                "top level must be a mapping, got {}",
                kind_name(&other)
            )),
        }
    }
}

#[async_trait]
impl Source for DocumentSource {
    async fn get(&self, path: &str) -> Result<Option<Value>, SourceError> {
        Ok(value::get_path(&self.data, path).cloned())
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Integer(_) | Value::Unsigned(_) => "integer",
        Value::Float(_) => "float",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
    }
}
