//! Directory enumeration and source loading.
//!
//! Walks every directory on the search path (split on the OS path-list
//! separator), decodes each recognized file, and discards files scoped to a
//! deployment or instance other than the active one. Any read or decode
//! failure aborts construction — there is no partial configuration.

use crate::classify::{self, Tier};
use crate::context::Context;
use crate::error::ConfigError;
use crate::source::{ClassifiedSource, DocumentSource};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
enum DocumentFormat {
    Json,
    Toml,
    Yaml,
}

/// Load classified sources from every directory on a path-list string.
///
/// Empty segments are ignored. Directories contribute to one flat list;
/// precedence comes solely from each file's own tier.
pub async fn load_search_path(
    search_path: &str,
    context: &Context,
    token: &CancellationToken,
) -> Result<Vec<ClassifiedSource>, ConfigError> {
    let mut sources = Vec::new();

    for dir in std::env::split_paths(search_path) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        sources.extend(load_directory(&dir, context, token).await?);
    }

    Ok(sources)
}

/// Load classified sources from the immediate entries of one directory.
pub async fn load_directory(
    dir: &Path,
    context: &Context,
    token: &CancellationToken,
) -> Result<Vec<ClassifiedSource>, ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::DirRead {
        dir: dir.display().to_string(),
        source,
    })?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_type().map(|t| t.is_dir()).unwrap_or(true))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    // Enumeration order is the tie-breaker for equal tiers; directory
    // iteration order is platform-dependent, so pin it.
    names.sort();

    let mut sources = Vec::new();

    for name in names {
        let format = match Path::new(&name).extension().and_then(|e| e.to_str()) {
            Some("json") => DocumentFormat::Json,
            Some("toml") => DocumentFormat::Toml,
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => continue,
        };

        let stem = classify::file_stem(&name);
        let classified = classify::classify(stem, &context.hostname);

        // env and vault files carry indirection targets for every
        // deployment; only plain document files are scoped.
        let exempt = matches!(classified.tier, Tier::Env | Tier::Vault);
        if !exempt {
            let deployment_mismatch = classified
                .deployment
                .as_deref()
                .is_some_and(|d| d != context.deployment);
            let instance_mismatch = classified
                .instance
                .as_deref()
                .is_some_and(|i| i != context.instance);

            if deployment_mismatch || instance_mismatch {
                debug!(file = %name, "skipping out-of-context source");
                continue;
            }
        }

        if token.is_cancelled() {
            return Err(ConfigError::Cancelled);
        }

        let path = dir.join(&name);
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::FileRead {
            file: path.display().to_string(),
            source,
        })?;

        let document = decode(format, content, name.clone(), token).await?;

        sources.push(ClassifiedSource {
            source: Box::new(document),
            tier: classified.tier,
            file: stem.to_string(),
        });
    }

    Ok(sources)
}

/// Decode off the runtime thread, racing the cancellation token.
async fn decode(
    format: DocumentFormat,
    content: String,
    file: String,
    token: &CancellationToken,
) -> Result<DocumentSource, ConfigError> {
    let handle = tokio::task::spawn_blocking(move || match format {
        DocumentFormat::Json => DocumentSource::from_json(&content),
        DocumentFormat::Toml => DocumentSource::from_toml(&content),
        DocumentFormat::Yaml => DocumentSource::from_yaml(&content),
    });

    tokio::select! {
        _ = token.cancelled() => Err(ConfigError::Cancelled),
        joined = handle => match joined {
            Ok(Ok(document)) => Ok(document),
            Ok(Err(message)) => Err(ConfigError::Decode { file, message }),
            Err(_) => Err(ConfigError::Decode {
                file,
                message: "decode task failed".to_string(),
            }),
        },
    }
}
