//! config-cascade CLI.
//!
//! Resolves one configuration path against a directory of layered sources
//! and prints the result. Vault credentials can be injected on the command
//! line; otherwise they bootstrap from the sources themselves.

use anyhow::Result;
use clap::Parser;
use config_cascade::vault::VaultAuth;
use config_cascade::{Config, Options};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "config-cascade",
    version,
    about = "Resolve a value from layered configuration sources"
)]
struct Cli {
    /// Configuration files directory; may be several directories joined by
    /// the OS path-list separator (default ./config)
    #[arg(short, long)]
    config: Option<String>,

    /// Active deployment name, e.g. production
    #[arg(short, long)]
    deployment: Option<String>,

    /// Active instance id in multi-instance deployments
    #[arg(short, long)]
    instance: Option<String>,

    /// Hostname override (default: OS hostname, domain suffix stripped)
    #[arg(long)]
    hostname: Option<String>,

    /// Dot-delimited configuration path to resolve
    #[arg(short, long)]
    get: String,

    /// Vault token, for token auth
    #[arg(long)]
    token: Option<String>,

    /// Vault username, for userpass auth
    #[arg(long)]
    username: Option<String>,

    /// Vault password, for userpass auth
    #[arg(long)]
    password: Option<String>,

    /// Vault role id, for approle auth
    #[arg(long)]
    roleid: Option<String>,

    /// Vault secret id, for approle auth
    #[arg(long)]
    secretid: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Credentials from flags: token wins, then userpass, then approle.
    fn vault_auth(&self) -> Option<VaultAuth> {
        if let Some(token) = &self.token {
            return Some(VaultAuth::Token(token.clone()));
        }

        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return Some(VaultAuth::UserPass {
                username: username.clone(),
                password: password.clone(),
                mount: "userpass".to_string(),
            });
        }

        if let (Some(role_id), Some(secret_id)) = (&self.roleid, &self.secretid) {
            return Some(VaultAuth::AppRole {
                role_id: role_id.clone(),
                secret_id: secret_id.clone(),
                mount: "approle".to_string(),
            });
        }

        None
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let vault_auth = cli.vault_auth();

    let config = Config::new(Options {
        directory: cli.config.clone(),
        deployment: cli.deployment.clone(),
        instance: cli.instance.clone(),
        hostname: cli.hostname.clone(),
        vault_client: None,
        vault_auth,
    })
    .await?;

    let token = CancellationToken::new();
    match config.get(&token, &cli.get).await? {
        Some(value) => println!("{value}"),
        None => {
            eprintln!("{:?} key not found", cli.get);
            std::process::exit(1);
        }
    }

    Ok(())
}
