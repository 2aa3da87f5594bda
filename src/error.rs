//! Error taxonomy.
//!
//! Construction failures are fatal and never retried. A lookup miss is not
//! an error at all — absence is an ordinary `None`. Per-source faults
//! ([`SourceError`]) are logged by the cascade and skipped; only
//! cancellation aborts a lookup.

use thiserror::Error;

/// Fatal conditions surfaced by [`crate::Config`] construction and lookups.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No usable source survived loading, filtering, and classification.
    #[error("no configuration sources found")]
    EmptyDir,

    /// A search directory could not be enumerated.
    #[error("failed to read config directory {dir}: {source}")]
    DirRead {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    /// A source file could not be opened.
    #[error("failed to read {file}: {source}")]
    FileRead {
        file: String,
        #[source]
        source: std::io::Error,
    },

    /// A source file failed to decode. Construction aborts; there is no
    /// partial configuration.
    #[error("failed to decode {file}: {message}")]
    Decode { file: String, message: String },

    /// A vault-tier source exists but no credentials were supplied or
    /// found in any source.
    #[error("vault unauthorized: no credentials supplied or found in sources")]
    VaultUnauthorized,

    /// The vault client could not be built or logged in.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// The operation was cancelled before completion.
    #[error("operation cancelled")]
    Cancelled,

    /// `must_get` exhausted every source. Carries the requested path.
    #[error("path {path:?} not found")]
    NotFound { path: String },
}

/// Per-source lookup faults. The cascade logs these at info level and
/// continues with the next source; they never abort a lookup.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A vault coordinate was not a string or not `mount,path[,key]`.
    #[error("invalid vault path")]
    InvalidVaultPath,

    /// The remote fetch failed or the secret is absent.
    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// Vault transport and protocol failures.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("vault request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("vault responded with status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("vault login returned no client token")]
    NoToken,

    #[error("vault secret {mount}/{path} has no data")]
    MissingData { mount: String, path: String },
}
