//! Vault KV v2 client.
//!
//! A deliberately small client: authenticate once with one of three
//! credential shapes, then read versioned key-value secrets. The token is
//! written exactly once at login and never mutated afterwards, so the
//! client can be shared freely across concurrent lookups.

use crate::error::VaultError;
use crate::value::{Mapping, Value};
use std::sync::OnceLock;
use std::time::Duration;

/// Connection parameters for [`VaultClient::new`].
///
/// Defaults mirror the upstream vault client: 60s request timeout, two
/// retries, 1000–1500ms backoff window.
#[derive(Debug, Clone)]
pub struct VaultSettings {
    /// Base address, e.g. `http://127.0.0.1:8200`.
    pub address: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub min_retry_wait: Duration,
    pub max_retry_wait: Duration,
}

impl VaultSettings {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
            min_retry_wait: Duration::from_millis(1000),
            max_retry_wait: Duration::from_millis(1500),
        }
    }
}

/// One of the three mutually exclusive credential shapes.
#[derive(Debug, Clone)]
pub enum VaultAuth {
    /// A pre-issued client token, installed without a login round-trip.
    Token(String),
    AppRole {
        role_id: String,
        secret_id: String,
        /// Auth mount path, default `approle`.
        mount: String,
    },
    UserPass {
        username: String,
        password: String,
        /// Auth mount path, default `userpass`.
        mount: String,
    },
}

/// Shared, read-mostly vault client.
#[derive(Debug)]
pub struct VaultClient {
    http: reqwest::Client,
    address: String,
    max_retries: u32,
    min_retry_wait: Duration,
    max_retry_wait: Duration,
    token: OnceLock<String>,
}

impl VaultClient {
    /// Build a client from connection parameters. No network traffic
    /// happens until [`login`](Self::login) or a read.
    pub fn new(settings: VaultSettings) -> Result<Self, VaultError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            http,
            address: settings.address.trim_end_matches('/').to_string(),
            max_retries: settings.max_retries,
            min_retry_wait: settings.min_retry_wait,
            max_retry_wait: settings.max_retry_wait,
            token: OnceLock::new(),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The installed client token, if a login has happened.
    pub fn token(&self) -> Option<&str> {
        self.token.get().map(String::as_str)
    }

    /// Authenticate and install the client token.
    ///
    /// Token auth installs the credential directly; the other shapes
    /// perform the corresponding login request. Installation is
    /// first-write-wins — a second login leaves the original token.
    pub async fn login(&self, auth: &VaultAuth) -> Result<(), VaultError> {
        let token = match auth {
            VaultAuth::Token(token) => token.clone(),
            VaultAuth::UserPass {
                username,
                password,
                mount,
            } => {
                let url = format!(
                    "{}/v1/auth/{}/login/{}",
                    self.address,
                    trim_mount(mount),
                    username
                );
                let body = serde_json::json!({ "password": password });
                self.login_request(&url, &body).await?
            }
            VaultAuth::AppRole {
                role_id,
                secret_id,
                mount,
            } => {
                let url = format!("{}/v1/auth/{}/login", self.address, trim_mount(mount));
                let body = serde_json::json!({
                    "role_id": role_id,
                    "secret_id": secret_id,
                });
                self.login_request(&url, &body).await?
            }
        };

        let _ = self.token.set(token);
        Ok(())
    }

    /// Fetch the current version of a KV v2 secret and return its inner
    /// data mapping.
    pub async fn read_kv(&self, mount: &str, path: &str) -> Result<Mapping, VaultError> {
        let url = format!("{}/v1/{}/data/{}", self.address, trim_mount(mount), path);

        let response = self
            .execute(|| {
                let mut request = self.http.get(&url);
                if let Some(token) = self.token.get() {
                    request = request.header("X-Vault-Token", token);
                }
                request
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VaultError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let payload: serde_json::Value = response.json().await?;
        let data = payload
            .get("data")
            .and_then(|outer| outer.get("data"))
            .cloned()
            .ok_or_else(|| VaultError::MissingData {
                mount: mount.to_string(),
                path: path.to_string(),
            })?;

        match Value::from(data) {
            Value::Mapping(mapping) => Ok(mapping),
            _ => Err(VaultError::MissingData {
                mount: mount.to_string(),
                path: path.to_string(),
            }),
        }
    }

    async fn login_request(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<String, VaultError> {
        let response = self.execute(|| self.http.post(url).json(body)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VaultError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let payload: serde_json::Value = response.json().await?;
        payload
            .get("auth")
            .and_then(|auth| auth.get("client_token"))
            .and_then(|token| token.as_str())
            .map(str::to_string)
            .ok_or(VaultError::NoToken)
    }

    /// Send a request, retrying transport errors and 5xx responses with
    /// exponential backoff clamped to the configured window.
    async fn execute(
        &self,
        make: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, VaultError> {
        let mut attempt: u32 = 0;

        loop {
            match make().send().await {
                Ok(response) if response.status().as_u16() < 500 => return Ok(response),
                Ok(response) => {
                    if attempt >= self.max_retries {
                        return Err(VaultError::Status {
                            status: response.status().as_u16(),
                            url: response.url().to_string(),
                        });
                    }
                }
                Err(err) => {
                    if attempt >= self.max_retries {
                        return Err(VaultError::Http(err));
                    }
                }
            }

            let backoff = self
                .min_retry_wait
                .saturating_mul(1u32 << attempt.min(16))
                .min(self.max_retry_wait);
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

fn trim_mount(mount: &str) -> &str {
    mount.trim_matches('/')
}

/// Parse a duration knob: a bare integer is seconds, otherwise a number
/// with an `ms`, `s`, `m`, or `h` suffix.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();

    if let Ok(seconds) = text.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }

    let (digits, unit) = match text.find(|c: char| !c.is_ascii_digit()) {
        Some(pos) if pos > 0 => text.split_at(pos),
        _ => return Err(format!("invalid duration {:?}", text)),
    };

    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration {:?}", text))?;

    match unit {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount * 60)),
        "h" => Ok(Duration::from_secs(amount * 3600)),
        _ => Err(format!("invalid duration {:?}", text)),
    }
}
