//! Layered configuration resolution.
//!
//! Resolves dot-delimited configuration paths against a cascade of sources
//! — files on disk, the process environment, and a vault secret store —
//! ordered by a precedence derived from each file's name and the active
//! (hostname, deployment, instance) context. `env` and `vault` files are
//! indirections: their leaf strings name environment variables or secret
//! coordinates, resolved at lookup time.

pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod loader;
pub mod norm;
pub mod source;
pub mod value;
pub mod vault;

pub use config::{Config, Options};
pub use context::Context;
pub use error::ConfigError;
pub use value::Value;
