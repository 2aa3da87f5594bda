//! Vault indirection.
//!
//! Wraps a document whose leaf strings are secret coordinates of the form
//! `mount,secretPath[,innerKey]`. A lookup resolves the coordinate, fetches
//! the KV v2 secret, and walks the fetched document. When the inner key is
//! omitted the original dotted query path doubles as the key, which lets a
//! secret mirror the structure of the paths that reference it.

use crate::error::SourceError;
use crate::source::Source;
use crate::value::{self, Value};
use crate::vault::VaultClient;
use async_trait::async_trait;
use std::sync::Arc;

/// Characters trimmed from coordinate components.
const TRIM_CHARS: &[char] = &['\t', '\r', '\n', ' '];

/// Decorator resolving wrapped string values as vault secret coordinates.
pub struct VaultSource {
    inner: Box<dyn Source>,
    client: Arc<VaultClient>,
}

impl VaultSource {
    pub fn new(inner: Box<dyn Source>, client: Arc<VaultClient>) -> Self {
        Self { inner, client }
    }

    /// The shared client, exposed so a caller can reuse the authenticated
    /// session.
    pub fn client(&self) -> Arc<VaultClient> {
        Arc::clone(&self.client)
    }
}

#[async_trait]
impl Source for VaultSource {
    async fn get(&self, path: &str) -> Result<Option<Value>, SourceError> {
        let Some(coordinate) = self.inner.get(path).await? else {
            return Ok(None);
        };

        let Some(coordinate) = coordinate.as_str() else {
            return Err(SourceError::InvalidVaultPath);
        };

        let (mount, secret_path, inner_key) = parse_coordinate(coordinate)?;

        let data = self.client.read_kv(&mount, &secret_path).await?;

        let key = if inner_key.is_empty() {
            path
        } else {
            inner_key.as_str()
        };

        Ok(value::get_path(&data, key).cloned())
    }
}

/// Split a `mount,secretPath[,innerKey]` coordinate. Exactly two or three
/// comma-separated components are valid.
fn parse_coordinate(coordinate: &str) -> Result<(String, String, String), SourceError> {
    let parts: Vec<&str> = coordinate.split(',').collect();

    match parts.as_slice() {
        [mount, path] => Ok((
            mount.trim_matches(TRIM_CHARS).to_string(),
            path.trim_matches(TRIM_CHARS).to_string(),
            String::new(),
        )),
        [mount, path, key] => Ok((
            mount.trim_matches(TRIM_CHARS).to_string(),
            path.trim_matches(TRIM_CHARS).to_string(),
            key.trim_matches(TRIM_CHARS).to_string(),
        )),
        _ => Err(SourceError::InvalidVaultPath),
    }
}
