//! Azure Key Vault provider
//!
//! Authenticates with an OAuth2 client-credentials grant (or a pre-issued
//! bearer token) and reads secrets through the Key Vault REST API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{AzureConfig, SecretLocation, SecretRecord, SecretRequest, SecretsError, SecretsProvider};

const API_VERSION: &str = "7.3";
const VAULT_SCOPE: &str = "https://vault.azure.net/.default";

/// Azure Key Vault provider
pub struct AzureProvider {
    client: Client,
    config: AzureConfig,
    vault_url: String,
    access_token: Arc<RwLock<Option<AccessToken>>>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: Secret<String>,
    /// None for a pre-issued token
    expires_at: Option<Instant>,
}

impl AccessToken {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at
                .checked_sub(Duration::from_secs(30))
                .map(|t| Instant::now() > t)
                .unwrap_or(true),
            None => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SecretBundle {
    value: Option<String>,
}

/// Make a name valid for Key Vault (`^[0-9a-zA-Z-]+$`).
///
/// Invalid characters become hyphens, hyphen runs collapse, leading and
/// trailing hyphens are trimmed, and names that end up empty or start with a
/// digit get a `secret-` prefix.
pub fn sanitize_secret_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '-' };
        if c == '-' && result.ends_with('-') {
            continue;
        }
        result.push(c);
    }
    let result = result.trim_matches('-');

    if result.is_empty() || result.starts_with(|c: char| c.is_ascii_digit()) {
        format!("secret-{result}")
    } else {
        result.to_string()
    }
}

fn normalize_vault_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    if !url.starts_with("https://") && !url.starts_with("http://") {
        url = format!("https://{url}");
    }
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

impl AzureProvider {
    pub async fn new(config: AzureConfig) -> Result<Self, SecretsError> {
        let vault_url = config
            .vault_url
            .as_deref()
            .map(normalize_vault_url)
            .ok_or_else(|| SecretsError::Config("AZURE_VAULT_URL is required".to_string()))?;

        let static_token = config.access_token.as_ref().map(|token| AccessToken {
            token: Secret::new(token.expose_secret().clone()),
            expires_at: None,
        });

        if static_token.is_none() && !config.has_client_credentials() {
            return Err(SecretsError::Config(
                "Azure requires AZURE_ACCESS_TOKEN or AZURE_TENANT_ID, AZURE_CLIENT_ID and AZURE_CLIENT_SECRET".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SecretsError::Config(format!("failed to create HTTP client: {e}")))?;

        let provider = Self {
            client,
            config,
            vault_url,
            access_token: Arc::new(RwLock::new(static_token)),
        };

        if let Err(e) = provider.authenticate().await {
            warn!(error = %e, "Azure authentication failed, will retry on first read");
        }

        info!(vault = %provider.vault_url, "Azure Key Vault provider ready");
        Ok(provider)
    }

    async fn authenticate(&self) -> Result<Secret<String>, SecretsError> {
        {
            let guard = self.access_token.read().await;
            if let Some(ref token) = *guard {
                if !token.is_expired() {
                    return Ok(Secret::new(token.token.expose_secret().clone()));
                }
            }
        }

        let (Some(tenant_id), Some(client_id), Some(client_secret)) = (
            &self.config.tenant_id,
            &self.config.client_id,
            &self.config.client_secret,
        ) else {
            return Err(SecretsError::Authentication(
                "access token expired and no client credentials configured".to_string(),
            ));
        };

        debug!("Requesting Azure access token");
        let token_url = format!(
            "{}/{tenant_id}/oauth2/v2.0/token",
            self.config.authority_host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.expose_secret().as_str()),
                ("scope", VAULT_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| SecretsError::Backend(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(SecretsError::Authentication(format!(
                "Azure authentication failed with status {status}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        let expires_at = Instant::now() + Duration::from_secs(token.expires_in);

        *self.access_token.write().await = Some(AccessToken {
            token: Secret::new(token.access_token.clone()),
            expires_at: Some(expires_at),
        });

        Ok(Secret::new(token.access_token))
    }
}

#[async_trait]
impl SecretsProvider for AzureProvider {
    fn name(&self) -> &'static str {
        "azure"
    }

    fn locate(&self, request: &SecretRequest) -> SecretLocation {
        let path = request
            .provider_label(self.name(), "secret_name")
            .or_else(|| request.provider_label(self.name(), "path"))
            .map(str::to_string)
            .unwrap_or_else(|| sanitize_secret_name(&request.scoped_name("-")));
        SecretLocation {
            path,
            field: request.provider_label(self.name(), "field").map(str::to_string),
        }
    }

    async fn read_record(&self, path: &str) -> Result<SecretRecord, SecretsError> {
        let token = self.authenticate().await?;
        let url = format!(
            "{}secrets/{}?api-version={API_VERSION}",
            self.vault_url,
            urlencoding::encode(path)
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| SecretsError::Backend(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let bundle: SecretBundle = response.json().await?;
                let value = bundle.value.ok_or_else(|| {
                    SecretsError::NotFound(format!("secret {path} has no value"))
                })?;
                Ok(SecretRecord::from_text(&value))
            }
            StatusCode::NOT_FOUND => Err(SecretsError::NotFound(format!(
                "secret {path} not found in Azure Key Vault"
            ))),
            StatusCode::UNAUTHORIZED => {
                if self.config.has_client_credentials() {
                    *self.access_token.write().await = None;
                }
                Err(SecretsError::Authentication("Token expired or invalid".to_string()))
            }
            StatusCode::FORBIDDEN => Err(SecretsError::PermissionDenied(path.to_string())),
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
}
