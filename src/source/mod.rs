//! Configuration sources.
//!
//! Every source — decoded file, environment indirection, vault indirection —
//! sits behind the one-method [`Source`] capability. The cascade walks a
//! sorted list of [`ClassifiedSource`] records and takes the first hit.

mod document;
mod env;
mod vault;

pub use document::DocumentSource;
pub use env::EnvSource;
pub use vault::VaultSource;

use crate::classify::Tier;
use crate::error::SourceError;
use crate::value::Value;
use async_trait::async_trait;

/// A single configuration source behind a uniform lookup capability.
///
/// `Ok(None)` is an ordinary miss. `Err` is a per-source fault — the
/// cascade logs it and continues with the next source.
#[async_trait]
pub trait Source: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Value>, SourceError>;
}

/// A source together with its precedence tier and originating filename.
///
/// Immutable after classification; owned by the [`crate::Config`]
/// aggregate for its whole lifetime.
pub struct ClassifiedSource {
    pub source: Box<dyn Source>,
    pub tier: Tier,
    /// Filename with its final extension stripped, e.g. `local-production`
    /// or `name.toml` for a `name.toml.json` file.
    pub file: String,
}

impl std::fmt::Debug for ClassifiedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifiedSource")
            .field("tier", &self.tier)
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}
