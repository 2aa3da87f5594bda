//! The cascade engine.
//!
//! Construction is two-phase. Phase one loads and classifies every file
//! into a flat, unsorted list; vault connection and credential fields are
//! resolved by scanning that raw list, so the vault source's own bootstrap
//! is satisfied by the same cascade it will later join. Phase two installs
//! the env/vault indirection wrappers and sorts by tier. After that the
//! aggregate is immutable and safe to query concurrently.

use crate::classify::{self, Tier};
use crate::context::{self, Context};
use crate::error::ConfigError;
use crate::loader;
use crate::norm::normalize;
use crate::source::{ClassifiedSource, EnvSource, VaultSource};
use crate::value::Value;
use crate::vault::{VaultAuth, VaultClient, VaultSettings, parse_duration};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Bootstrap paths scanned for vault connection parameters.
const VAULT_ADDRESS_PATH: &str = "cascade.vault.address";
const VAULT_MIN_RETRY_WAIT_PATH: &str = "cascade.vault.min_retry_wait";
const VAULT_MAX_RETRY_WAIT_PATH: &str = "cascade.vault.max_retry_wait";
const VAULT_MAX_RETRIES_PATH: &str = "cascade.vault.max_retries";
const VAULT_TIMEOUT_PATH: &str = "cascade.vault.timeout";

/// Bootstrap paths scanned for vault credentials.
const VAULT_AUTH_TOKEN_PATH: &str = "cascade.vault.auth.token";
const VAULT_AUTH_MOUNT_PATH: &str = "cascade.vault.auth.mount";
const VAULT_AUTH_ROLEID_PATH: &str = "cascade.vault.auth.roleid";
const VAULT_AUTH_SECRETID_PATH: &str = "cascade.vault.auth.secretid";
const VAULT_AUTH_USERNAME_PATH: &str = "cascade.vault.auth.username";
const VAULT_AUTH_PASSWORD_PATH: &str = "cascade.vault.auth.password";

/// Fallback address variable when no source defines one.
const VAULT_ADDR_ENV: &str = "VAULT_ADDR";

/// Construction options. Every field is optional:
///
/// - `directory`: search path for config files, possibly several
///   directories joined by the OS path-list separator. Falls back to
///   `CASCADE_CONFIG_PATH`, then `./config`.
/// - `deployment`: active deployment name, e.g. `production`. Falls back
///   to `CASCADE_DEPLOYMENT`.
/// - `instance`: instance id in multi-instance deployments. Falls back to
///   `CASCADE_INSTANCE`.
/// - `hostname`: overrides the OS hostname (which is otherwise stripped
///   of its domain suffix at the first dot).
/// - `vault_client`: a pre-built client; skips the connection bootstrap.
/// - `vault_auth`: pre-built credentials; skips the credential bootstrap.
#[derive(Default)]
pub struct Options {
    pub directory: Option<String>,
    pub deployment: Option<String>,
    pub instance: Option<String>,
    pub hostname: Option<String>,
    pub vault_client: Option<Arc<VaultClient>>,
    pub vault_auth: Option<VaultAuth>,
}

/// The configuration aggregate: an ordered list of classified sources and
/// the immutable context that selected them.
#[derive(Debug)]
pub struct Config {
    sources: Arc<Vec<ClassifiedSource>>,
    context: Context,
    vault_client: Option<Arc<VaultClient>>,
}

impl Config {
    /// Construct a configuration that cannot be cancelled externally.
    pub async fn new(options: Options) -> Result<Self, ConfigError> {
        Self::with_cancellation(&CancellationToken::new(), options).await
    }

    /// Construct a configuration, aborting as soon as `token` fires.
    pub async fn with_cancellation(
        token: &CancellationToken,
        options: Options,
    ) -> Result<Self, ConfigError> {
        if token.is_cancelled() {
            return Err(ConfigError::Cancelled);
        }

        let context = Context::resolve(options.hostname, options.deployment, options.instance);
        let search_path = context::resolve_directory(options.directory);

        debug!(
            directory = %search_path,
            hostname = %context.hostname,
            deployment = %context.deployment,
            instance = %context.instance,
            "loading configuration"
        );

        // Phase 1: a flat, unsorted, unwrapped source list. Bootstrap
        // queries below must see every candidate source, not just the
        // higher-precedence ones.
        let sources = loader::load_search_path(&search_path, &context, token).await?;

        let has_vault = sources.iter().any(|s| s.tier == Tier::Vault);
        let mut vault_client = options.vault_client;

        if has_vault && vault_client.is_none() {
            match scan_vault_settings(&sources).await {
                Some(settings) => {
                    vault_client = Some(Arc::new(VaultClient::new(settings)?));
                }
                None => {
                    debug!("no vault address configured; vault sources disabled");
                }
            }
        }

        if has_vault
            && let Some(client) = &vault_client
            && client.token().is_none()
        {
            let auth = match options.vault_auth {
                Some(auth) => auth,
                None => scan_vault_auth(&sources)
                    .await
                    .ok_or(ConfigError::VaultUnauthorized)?,
            };

            tokio::select! {
                _ = token.cancelled() => return Err(ConfigError::Cancelled),
                result = client.login(&auth) => result?,
            }
        }

        // Phase 2: install indirection wrappers, then order by tier.
        let mut installed: Vec<ClassifiedSource> = Vec::with_capacity(sources.len());
        for entry in sources {
            match entry.tier {
                Tier::Env => installed.push(ClassifiedSource {
                    source: Box::new(EnvSource::new(entry.source)),
                    tier: entry.tier,
                    file: entry.file,
                }),
                Tier::Vault => match &vault_client {
                    Some(client) => installed.push(ClassifiedSource {
                        source: Box::new(VaultSource::new(entry.source, Arc::clone(client))),
                        tier: entry.tier,
                        file: entry.file,
                    }),
                    None => {
                        debug!(file = %entry.file, "dropping disabled vault source");
                    }
                },
                _ => installed.push(entry),
            }
        }

        // Stable sort: equal tiers keep their discovery order.
        installed.sort_by(|a, b| b.tier.cmp(&a.tier));

        if installed.is_empty() {
            return Err(ConfigError::EmptyDir);
        }

        for (index, source) in installed.iter().enumerate() {
            debug!(index, file = %source.file, tier = %source.tier, "installed source");
        }

        // The client is only exposed while a vault source actually uses it.
        if !installed.iter().any(|s| s.tier == Tier::Vault) {
            vault_client = None;
        }

        Ok(Self {
            sources: Arc::new(installed),
            context,
            vault_client,
        })
    }

    /// Resolve a dot-delimited path, walking sources from highest to
    /// lowest precedence and returning the first hit.
    ///
    /// `Ok(None)` means every source missed; the only error is
    /// cancellation. Per-source faults are logged and skipped.
    pub async fn get(
        &self,
        token: &CancellationToken,
        path: &str,
    ) -> Result<Option<Value>, ConfigError> {
        self.get_from(token, path, &[]).await
    }

    /// Like [`get`](Self::get), restricted to sources whose filename
    /// (with or without its extension) appears in `files`. The filter
    /// does not change the search order. Filtering to plain files lets a
    /// diagnostic read what sits beneath the env and vault tiers.
    pub async fn get_from(
        &self,
        token: &CancellationToken,
        path: &str,
        files: &[&str],
    ) -> Result<Option<Value>, ConfigError> {
        debug!(path, "resolving configuration path");

        let sources = Arc::clone(&self.sources);
        let path = path.to_string();
        let files: Vec<String> = files.iter().map(|f| f.to_string()).collect();

        // The walk runs on its own task so a hanging remote fetch can be
        // abandoned the moment the token fires.
        let lookup = tokio::spawn(async move { search_sources(&sources, &path, &files).await });

        tokio::select! {
            _ = token.cancelled() => Err(ConfigError::Cancelled),
            joined = lookup => match joined {
                Ok(value) => Ok(value),
                Err(err) => {
                    warn!(error = %err, "lookup task failed");
                    Ok(None)
                }
            },
        }
    }

    /// Resolve a path that must exist. A miss is
    /// [`ConfigError::NotFound`]; cancellation is
    /// [`ConfigError::Cancelled`] — callers distinguish the two by
    /// matching on the error.
    pub async fn must_get(
        &self,
        token: &CancellationToken,
        path: &str,
    ) -> Result<Value, ConfigError> {
        self.must_get_from(token, path, &[]).await
    }

    /// [`must_get`](Self::must_get) with a filename filter.
    pub async fn must_get_from(
        &self,
        token: &CancellationToken,
        path: &str,
        files: &[&str],
    ) -> Result<Value, ConfigError> {
        match self.get_from(token, path, files).await? {
            Some(value) => Ok(value),
            None => Err(ConfigError::NotFound {
                path: path.to_string(),
            }),
        }
    }

    /// The resolved deployment context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The constructed (or injected) vault client, so callers can reuse
    /// the authenticated session. `None` when no vault source survived.
    pub fn vault_client(&self) -> Option<Arc<VaultClient>> {
        self.vault_client.clone()
    }
}

/// Walk sources in order, returning the first hit, normalized.
async fn search_sources(
    sources: &[ClassifiedSource],
    path: &str,
    files: &[String],
) -> Option<Value> {
    for entry in sources {
        if !files.is_empty() && !matches_filter(&entry.file, files) {
            continue;
        }

        match entry.source.get(path).await {
            Ok(Some(value)) => return Some(normalize(value)),
            Ok(None) => {}
            Err(err) => {
                info!(file = %entry.file, error = %err, "source fault; continuing cascade");
            }
        }
    }

    None
}

/// A filter entry selects a source by its stored stem, by the stem with
/// one more extension stripped (`name` selects a `name.toml.json` file,
/// stored as `name.toml`), or by the stem plus an extension (`env.toml`
/// selects `env`).
fn matches_filter(file: &str, files: &[String]) -> bool {
    files.iter().any(|f| {
        file == f || classify::file_stem(file) == f || classify::file_stem(f) == file
    })
}

/// First hit for `path` across the raw source list, in discovery order.
async fn scan_value(sources: &[ClassifiedSource], path: &str) -> Option<Value> {
    for entry in sources {
        if let Ok(Some(value)) = entry.source.get(path).await {
            return Some(value);
        }
    }
    None
}

/// Like [`scan_value`] but only accepts a string hit.
async fn scan_string(sources: &[ClassifiedSource], path: &str) -> Option<String> {
    match scan_value(sources, path).await? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// Resolve vault connection parameters from the raw sources. `None` means
/// no address is configured anywhere and vault stays disabled.
async fn scan_vault_settings(sources: &[ClassifiedSource]) -> Option<VaultSettings> {
    let address = match scan_string(sources, VAULT_ADDRESS_PATH).await {
        Some(address) => address,
        None => std::env::var(VAULT_ADDR_ENV).ok().filter(|a| !a.is_empty())?,
    };

    let mut settings = VaultSettings::new(address);

    if let Some(text) = scan_string(sources, VAULT_MIN_RETRY_WAIT_PATH).await
        && let Ok(duration) = parse_duration(&text)
    {
        settings.min_retry_wait = duration;
    }

    if let Some(text) = scan_string(sources, VAULT_MAX_RETRY_WAIT_PATH).await
        && let Ok(duration) = parse_duration(&text)
    {
        settings.max_retry_wait = duration;
    }

    if let Some(text) = scan_string(sources, VAULT_TIMEOUT_PATH).await
        && let Ok(duration) = parse_duration(&text)
    {
        settings.timeout = duration;
    }

    if let Some(text) = scan_string(sources, VAULT_MAX_RETRIES_PATH).await
        && let Ok(count) = text.parse()
    {
        settings.max_retries = count;
    }

    Some(settings)
}

/// Resolve credentials from the raw sources. Token wins over approle,
/// approle over userpass.
async fn scan_vault_auth(sources: &[ClassifiedSource]) -> Option<VaultAuth> {
    if let Some(token) = scan_string(sources, VAULT_AUTH_TOKEN_PATH).await {
        return Some(VaultAuth::Token(token));
    }

    let mount = scan_string(sources, VAULT_AUTH_MOUNT_PATH).await;

    if scan_value(sources, VAULT_AUTH_ROLEID_PATH).await.is_some() {
        let role_id = scan_string(sources, VAULT_AUTH_ROLEID_PATH)
            .await
            .unwrap_or_default();
        let secret_id = scan_string(sources, VAULT_AUTH_SECRETID_PATH)
            .await
            .unwrap_or_default();

        return Some(VaultAuth::AppRole {
            role_id,
            secret_id,
            mount: mount.unwrap_or_else(|| "approle".to_string()),
        });
    }

    if scan_value(sources, VAULT_AUTH_USERNAME_PATH)
        .await
        .is_some()
    {
        let username = scan_string(sources, VAULT_AUTH_USERNAME_PATH)
            .await
            .unwrap_or_default();
        let password = scan_string(sources, VAULT_AUTH_PASSWORD_PATH)
            .await
            .unwrap_or_default();

        return Some(VaultAuth::UserPass {
            username,
            password,
            mount: mount.unwrap_or_else(|| "userpass".to_string()),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DocumentSource;

    fn doc_source(tier: Tier, file: &str, toml: &str) -> ClassifiedSource {
        ClassifiedSource {
            source: Box::new(DocumentSource::from_toml(toml).unwrap()),
            tier,
            file: file.to_string(),
        }
    }

    #[test]
    fn filter_matches_with_and_without_extension() {
        let files = vec!["default".to_string()];
        assert!(matches_filter("default", &files));
        assert!(!matches_filter("local", &files));

        let files = vec!["default.toml".to_string()];
        assert!(matches_filter("default", &files));

        // A `name.toml.json` file is stored as `name.toml`; the bare base
        // name still selects it.
        let files = vec!["name".to_string()];
        assert!(matches_filter("name.toml", &files));
    }

    #[tokio::test]
    async fn scan_walks_discovery_order_not_tiers() {
        // The bootstrap scan must see the raw list order, not precedence.
        let sources = vec![
            doc_source(Tier::Default, "default", "[cascade.vault]\naddress = \"http://first\""),
            doc_source(Tier::Local, "local", "[cascade.vault]\naddress = \"http://second\""),
        ];

        let settings = scan_vault_settings(&sources).await.unwrap();
        assert_eq!(settings.address, "http://first");
    }

    #[tokio::test]
    async fn scan_settings_reads_knobs() {
        let sources = vec![doc_source(
            Tier::Default,
            "default",
            r#"
[cascade.vault]
address = "http://127.0.0.1:8200"
timeout = "30s"
min_retry_wait = "100ms"
max_retry_wait = "2s"
max_retries = "5"
"#,
        )];

        let settings = scan_vault_settings(&sources).await.unwrap();
        assert_eq!(settings.timeout, std::time::Duration::from_secs(30));
        assert_eq!(settings.min_retry_wait, std::time::Duration::from_millis(100));
        assert_eq!(settings.max_retry_wait, std::time::Duration::from_secs(2));
        assert_eq!(settings.max_retries, 5);
    }

    #[tokio::test]
    async fn auth_precedence_token_approle_userpass() {
        let both = vec![doc_source(
            Tier::Default,
            "default",
            r#"
[cascade.vault.auth]
token = "tok"
roleid = "r"
secretid = "s"
username = "u"
password = "p"
"#,
        )];
        assert!(matches!(
            scan_vault_auth(&both).await,
            Some(VaultAuth::Token(t)) if t == "tok"
        ));

        let approle = vec![doc_source(
            Tier::Default,
            "default",
            "[cascade.vault.auth]\nroleid = \"r\"\nsecretid = \"s\"\nusername = \"u\"\npassword = \"p\"",
        )];
        assert!(matches!(
            scan_vault_auth(&approle).await,
            Some(VaultAuth::AppRole { mount, .. }) if mount == "approle"
        ));

        let userpass = vec![doc_source(
            Tier::Default,
            "default",
            "[cascade.vault.auth]\nusername = \"u\"\npassword = \"p\"\nmount = \"corp\"",
        )];
        assert!(matches!(
            scan_vault_auth(&userpass).await,
            Some(VaultAuth::UserPass { mount, .. }) if mount == "corp"
        ));

        assert!(scan_vault_auth(&[]).await.is_none());
    }
}
