//! HashiCorp Vault / OpenBao secrets provider
//!
//! Reads secrets through the logical read API (`GET /v1/<path>`), unwrapping
//! the KV v2 `data.data` envelope when the mount is a KV v2 engine.
//! Supports static token and AppRole authentication.

use async_trait::async_trait;
use reqwest::{Certificate, Client, Identity, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{SecretLocation, SecretRecord, SecretRequest, SecretsError, SecretsProvider, VaultConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Vault,
    OpenBao,
}

impl Flavor {
    fn name(self) -> &'static str {
        match self {
            Flavor::Vault => "vault",
            Flavor::OpenBao => "openbao",
        }
    }

    fn env_prefix(self) -> &'static str {
        match self {
            Flavor::Vault => "VAULT",
            Flavor::OpenBao => "OPENBAO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMethod {
    Token,
    AppRole,
}

#[derive(Serialize)]
struct AppRoleLogin<'a> {
    role_id: &'a str,
    secret_id: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Deserialize)]
struct ReadResponse {
    data: Option<Map<String, Value>>,
}

/// Vault (or OpenBao) provider
pub struct VaultProvider {
    client: Client,
    config: VaultConfig,
    flavor: Flavor,
    auth_method: AuthMethod,
    /// Token in use; re-obtained on demand for AppRole
    token: Arc<RwLock<Option<SecretString>>>,
}

impl VaultProvider {
    /// Create a Vault provider and authenticate
    pub async fn new(config: VaultConfig) -> Result<Self, SecretsError> {
        Self::with_flavor(config, Flavor::Vault).await
    }

    /// Create an OpenBao provider and authenticate
    pub async fn openbao(config: VaultConfig) -> Result<Self, SecretsError> {
        Self::with_flavor(config, Flavor::OpenBao).await
    }

    async fn with_flavor(mut config: VaultConfig, flavor: Flavor) -> Result<Self, SecretsError> {
        let prefix = flavor.env_prefix();

        config.address = config.address.trim().trim_end_matches('/').to_string();
        if config.address.is_empty() {
            return Err(SecretsError::Config(format!("{prefix}_ADDR is required")));
        }

        let auth_method = match config.auth_method.to_lowercase().as_str() {
            "token" => {
                if config.token.is_none() {
                    return Err(SecretsError::Config(format!(
                        "{prefix}_TOKEN is required for token authentication"
                    )));
                }
                AuthMethod::Token
            }
            "approle" => {
                if config.role_id.is_none() || config.secret_id.is_none() {
                    return Err(SecretsError::Config(format!(
                        "{prefix}_ROLE_ID and {prefix}_SECRET_ID are required for approle authentication"
                    )));
                }
                AuthMethod::AppRole
            }
            other => {
                return Err(SecretsError::Config(format!(
                    "unsupported authentication method: {other}"
                )))
            }
        };

        let client = build_client(&config).await?;

        let provider = Self {
            client,
            config,
            flavor,
            auth_method,
            token: Arc::new(RwLock::new(None)),
        };

        // AppRole logs in again on the next read, so a failed login only warns
        match provider.authenticate().await {
            Ok(_) => info!(
                provider = flavor.name(),
                address = %provider.config.address,
                mount = %provider.config.mount_path,
                auth_method = ?provider.auth_method,
                "Authenticated with secrets backend"
            ),
            Err(e) => warn!(
                provider = flavor.name(),
                error = %e,
                "Initial authentication failed, will retry on first read"
            ),
        }

        Ok(provider)
    }

    /// Backend path for a request: label override, else `<service>/<name>`,
    /// else `<name>`, under the configured mount.
    pub fn secret_path(&self, request: &SecretRequest) -> String {
        let relative = match request.provider_label(self.flavor.name(), "path") {
            Some(custom) => custom.trim_matches('/').to_string(),
            None => request.scoped_name("/"),
        };
        let mount = self.config.mount_path.trim_matches('/');

        if self.config.is_kv2() {
            format!("{mount}/data/{relative}")
        } else {
            format!("{mount}/{relative}")
        }
    }

    async fn authenticate(&self) -> Result<SecretString, SecretsError> {
        {
            let guard = self.token.read().await;
            if let Some(ref token) = *guard {
                return Ok(SecretString::new(token.expose_secret().clone()));
            }
        }

        let token = match self.auth_method {
            AuthMethod::Token => self
                .config
                .token
                .as_ref()
                .map(|t| t.expose_secret().clone())
                .ok_or_else(|| SecretsError::Config("missing token".to_string()))?,
            AuthMethod::AppRole => self.login_approle().await?,
        };

        *self.token.write().await = Some(SecretString::new(token.clone()));
        Ok(SecretString::new(token))
    }

    async fn login_approle(&self) -> Result<String, SecretsError> {
        debug!(provider = self.flavor.name(), "Logging in with AppRole");

        let (Some(role_id), Some(secret_id)) = (&self.config.role_id, &self.config.secret_id) else {
            return Err(SecretsError::Config("missing approle credentials".to_string()));
        };

        let url = format!("{}/v1/auth/approle/login", self.config.address);
        let response = self
            .with_namespace(self.client.post(&url))
            .json(&AppRoleLogin {
                role_id,
                secret_id: secret_id.expose_secret(),
            })
            .send()
            .await
            .map_err(|e| SecretsError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SecretsError::Authentication(format!(
                "approle authentication failed: HTTP {status}: {body}"
            )));
        }

        let login: LoginResponse = response.json().await?;
        login
            .auth
            .map(|auth| auth.client_token)
            .ok_or_else(|| {
                SecretsError::Authentication("no auth info returned from approle login".to_string())
            })
    }

    async fn forget_token(&self) {
        if self.auth_method == AuthMethod::AppRole {
            *self.token.write().await = None;
        }
    }

    fn with_namespace(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.namespace {
            Some(ref namespace) => builder.header("X-Vault-Namespace", namespace),
            None => builder,
        }
    }
}

async fn build_client(config: &VaultConfig) -> Result<Client, SecretsError> {
    let mut builder = Client::builder().timeout(Duration::from_secs(30));

    if let Some(ref ca_cert) = config.ca_cert {
        let pem = read_pem(ca_cert).await?;
        let cert = Certificate::from_pem(&pem)
            .map_err(|e| SecretsError::Config(format!("failed to configure TLS: {e}")))?;
        builder = builder.add_root_certificate(cert);
    }

    if let (Some(ref cert), Some(ref key)) = (&config.client_cert, &config.client_key) {
        let cert = read_pem(cert).await?;
        let key = read_pem(key).await?;
        let identity = Identity::from_pkcs8_pem(&cert, &key)
            .map_err(|e| SecretsError::Config(format!("failed to configure TLS: {e}")))?;
        builder = builder.identity(identity);
    }

    builder
        .build()
        .map_err(|e| SecretsError::Config(format!("failed to create vault client: {e}")))
}

async fn read_pem(path: &Path) -> Result<Vec<u8>, SecretsError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| SecretsError::Config(format!("failed to read {}: {e}", path.display())))
}

#[async_trait]
impl SecretsProvider for VaultProvider {
    fn name(&self) -> &'static str {
        self.flavor.name()
    }

    fn locate(&self, request: &SecretRequest) -> SecretLocation {
        SecretLocation {
            path: self.secret_path(request),
            field: request
                .provider_label(self.flavor.name(), "field")
                .map(str::to_string),
        }
    }

    async fn read_record(&self, path: &str) -> Result<SecretRecord, SecretsError> {
        let token = self.authenticate().await?;
        let url = format!("{}/v1/{}", self.config.address, path);

        let response = self
            .with_namespace(self.client.get(&url))
            .header("X-Vault-Token", token.expose_secret())
            .send()
            .await
            .map_err(|e| SecretsError::Backend(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body: ReadResponse = response.json().await?;
                let mut data = body.data.ok_or_else(|| {
                    SecretsError::NotFound(format!("secret at {path} has no data"))
                })?;

                if self.config.is_kv2() {
                    if let Some(Value::Object(inner)) = data.remove("data") {
                        data = inner;
                    }
                }
                Ok(SecretRecord::from(data))
            }
            StatusCode::NOT_FOUND => Err(SecretsError::NotFound(format!(
                "secret not found at path: {path} (verify the secret exists in {})",
                self.flavor.name()
            ))),
            StatusCode::UNAUTHORIZED => {
                self.forget_token().await;
                Err(SecretsError::Authentication("token rejected".to_string()))
            }
            StatusCode::FORBIDDEN => {
                // An expired AppRole token also surfaces as 403
                self.forget_token().await;
                warn!(path = %path, "Permission denied reading secret");
                Err(SecretsError::PermissionDenied(path.to_string()))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                Err(SecretsError::RateLimited("Rate limit exceeded".to_string()))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(SecretsError::Backend(format!("HTTP {status}: {body}")))
            }
        }
    }

    async fn health_check(&self) -> Result<(), SecretsError> {
        self.authenticate().await.map(|_| ())
    }

    async fn close(&self) {
        *self.token.write().await = None;
    }
}
