//! Environment-variable indirection.
//!
//! Wraps a document whose leaf strings are environment variable *names*.
//! A lookup first resolves the path in the wrapped document, then reads
//! the named variable's current value from the process environment — on
//! every call, so changes after construction are visible.

use crate::error::SourceError;
use crate::source::Source;
use crate::value::Value;
use async_trait::async_trait;

/// Decorator resolving wrapped string values as environment variables.
pub struct EnvSource {
    inner: Box<dyn Source>,
}

impl EnvSource {
    pub fn new(inner: Box<dyn Source>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Source for EnvSource {
    async fn get(&self, path: &str) -> Result<Option<Value>, SourceError> {
        let Some(value) = self.inner.get(path).await? else {
            return Ok(None);
        };

        let Some(name) = value.as_str() else {
            return Ok(None);
        };

        // An unset variable is a miss, and so is an empty one: there is no
        // way to express an intentionally empty override, which keeps an
        // empty export from shadowing a lower-tier value.
        match std::env::var(name) {
            Ok(current) if !current.is_empty() => Ok(Some(Value::String(current))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DocumentSource;

    fn wrapped(doc: &str) -> EnvSource {
        EnvSource::new(Box::new(DocumentSource::from_toml(doc).unwrap()))
    }

    #[tokio::test]
    async fn resolves_the_named_variable() {
        let source = wrapped(r#"field = "ENV_SOURCE_RESOLVES""#);

        unsafe { std::env::set_var("ENV_SOURCE_RESOLVES", "value1") };
        assert_eq!(
            source.get("field").await.unwrap(),
            Some(Value::String("value1".to_string()))
        );
        unsafe { std::env::remove_var("ENV_SOURCE_RESOLVES") };
    }

    #[tokio::test]
    async fn unset_and_empty_variables_are_misses() {
        let source = wrapped(r#"field = "ENV_SOURCE_UNSET_OR_EMPTY""#);

        unsafe { std::env::remove_var("ENV_SOURCE_UNSET_OR_EMPTY") };
        assert_eq!(source.get("field").await.unwrap(), None);

        unsafe { std::env::set_var("ENV_SOURCE_UNSET_OR_EMPTY", "") };
        assert_eq!(source.get("field").await.unwrap(), None);
        unsafe { std::env::remove_var("ENV_SOURCE_UNSET_OR_EMPTY") };
    }

    #[tokio::test]
    async fn non_string_targets_are_misses() {
        let source = wrapped("field = 42");
        assert_eq!(source.get("field").await.unwrap(), None);
        assert_eq!(source.get("absent").await.unwrap(), None);
    }
}
