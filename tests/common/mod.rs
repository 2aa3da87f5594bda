//! Shared fixtures: config directory builders and an in-process mock
//! vault server speaking just enough of the KV v2 HTTP surface for the
//! client — userpass and approle logins, token-checked secret reads.
#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Root token honored by the mock server.
pub const VAULT_TOKEN: &str = "mock-root-token";
/// Userpass credentials honored by the mock server.
pub const VAULT_USERNAME: &str = "config";
pub const VAULT_PASSWORD: &str = "hunter2";
/// Approle credentials honored by the mock server.
pub const VAULT_ROLE_ID: &str = "role-1234";
pub const VAULT_SECRET_ID: &str = "secret-5678";

/// Write one config file into a fixture directory.
pub fn write_file(dir: &FsPath, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("write fixture file");
}

#[derive(Clone)]
struct VaultServerState {
    secrets: Arc<HashMap<String, serde_json::Value>>,
}

/// Handle to a running mock vault server. Shuts down on drop.
pub struct MockVault {
    pub address: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for MockVault {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Start a mock vault holding the given secrets, keyed `"mount/path"`.
pub async fn start_mock_vault(secrets: HashMap<String, serde_json::Value>) -> MockVault {
    let state = VaultServerState {
        secrets: Arc::new(secrets),
    };

    let app = Router::new()
        .route("/v1/auth/userpass/login/{username}", post(userpass_login))
        .route("/v1/auth/approle/login", post(approle_login))
        .route("/v1/{mount}/data/{*path}", get(read_secret))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock vault");
    let address = format!("http://{}", listener.local_addr().expect("local addr"));

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await
            .expect("serve mock vault");
    });

    MockVault {
        address,
        shutdown: Some(tx),
    }
}

async fn userpass_login(
    Path(username): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    let password = body.get("password").and_then(|p| p.as_str());

    if username == VAULT_USERNAME && password == Some(VAULT_PASSWORD) {
        login_success()
    } else {
        login_failure()
    }
}

async fn approle_login(
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    let role_id = body.get("role_id").and_then(|v| v.as_str());
    let secret_id = body.get("secret_id").and_then(|v| v.as_str());

    if role_id == Some(VAULT_ROLE_ID) && secret_id == Some(VAULT_SECRET_ID) {
        login_success()
    } else {
        login_failure()
    }
}

fn login_success() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "auth": { "client_token": VAULT_TOKEN }
        })),
    )
}

fn login_failure() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({ "errors": ["invalid credentials"] })),
    )
}

async fn read_secret(
    Path((mount, path)): Path<(String, String)>,
    State(state): State<VaultServerState>,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    let token = headers
        .get("X-Vault-Token")
        .and_then(|value| value.to_str().ok());

    if token != Some(VAULT_TOKEN) {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "errors": ["permission denied"] })),
        );
    }

    match state.secrets.get(&format!("{mount}/{path}")) {
        Some(data) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "data": {
                    "data": data,
                    "metadata": { "version": 1 }
                }
            })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "errors": [] })),
        ),
    }
}
