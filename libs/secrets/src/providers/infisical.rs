//! Infisical secrets provider
//!
//! Uses machine identity authentication to fetch secrets from Infisical.
//! See: https://infisical.com/docs/documentation/platform/identities/machine-identities
//!
//! Paths are `<folder>/<key>`; the key is the last segment.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{InfisicalConfig, SecretLocation, SecretRecord, SecretRequest, SecretsError, SecretsProvider};

/// Infisical secrets provider using machine identity authentication
pub struct InfisicalProvider {
    client: Client,
    config: InfisicalConfig,
    /// Cached access token
    access_token: Arc<RwLock<Option<AccessToken>>>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: Secret<String>,
    expires_at: std::time::Instant,
}

impl AccessToken {
    fn is_expired(&self) -> bool {
        // Expire 30 seconds early
        self.expires_at
            .checked_sub(std::time::Duration::from_secs(30))
            .map(|t| std::time::Instant::now() > t)
            .unwrap_or(true)
    }
}

// API Response types

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "expiresIn")]
    expires_in: u64,
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    #[serde(rename = "clientId")]
    client_id: &'a str,
    #[serde(rename = "clientSecret")]
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct SecretEntry {
    #[serde(rename = "secretValue")]
    secret_value: String,
}

#[derive(Debug, Deserialize)]
struct SingleSecretResponse {
    secret: SecretEntry,
}

/// Split `<folder>/<key>` at the last slash. The folder always starts with `/`.
fn split_path(path: &str) -> (String, &str) {
    let trimmed = path.trim_matches('/');
    match trimmed.rsplit_once('/') {
        Some((folder, key)) => (format!("/{folder}"), key),
        None => ("/".to_string(), trimmed),
    }
}

impl InfisicalProvider {
    /// Create a new Infisical provider with the given configuration
    ///
    /// Authenticates upfront; a failed login is retried on the first read.
    pub async fn new(config: InfisicalConfig) -> Result<Self, SecretsError> {
        if !config.is_configured() {
            return Err(SecretsError::Config(
                "Infisical configuration is incomplete. Required: INFISICAL_CLIENT_ID, INFISICAL_CLIENT_SECRET, INFISICAL_PROJECT_ID, INFISICAL_ENVIRONMENT".to_string()
            ));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| SecretsError::Config(format!("failed to create HTTP client: {e}")))?;

        let provider = Self {
            client,
            config,
            access_token: Arc::new(RwLock::new(None)),
        };

        if let Err(e) = provider.authenticate().await {
            warn!(error = %e, "Initial Infisical authentication failed");
        }

        Ok(provider)
    }

    /// Authenticate with Infisical using machine identity credentials
    async fn authenticate(&self) -> Result<Secret<String>, SecretsError> {
        {
            let token_guard = self.access_token.read().await;
            if let Some(ref token) = *token_guard {
                if !token.is_expired() {
                    return Ok(Secret::new(token.token.expose_secret().clone()));
                }
            }
        }

        debug!("Authenticating with Infisical");

        let auth_url = format!("{}/api/v1/auth/universal-auth/login", self.config.api_url());

        let (Some(client_id), Some(client_secret)) =
            (&self.config.client_id, &self.config.client_secret)
        else {
            return Err(SecretsError::Config("Missing client credentials".to_string()));
        };

        let response = self
            .client
            .post(&auth_url)
            .json(&AuthRequest {
                client_id,
                client_secret: client_secret.expose_secret(),
            })
            .send()
            .await
            .map_err(|e| SecretsError::Backend(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SecretsError::Authentication(
                "Invalid client credentials".to_string(),
            ));
        }

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SecretsError::RateLimited(
                "Too many authentication attempts".to_string(),
            ));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SecretsError::Authentication(format!("HTTP {status}: {body}")));
        }

        let auth_response: AuthResponse = response.json().await?;

        let access_token = AccessToken {
            token: Secret::new(auth_response.access_token.clone()),
            expires_at: std::time::Instant::now()
                + std::time::Duration::from_secs(auth_response.expires_in),
        };

        *self.access_token.write().await = Some(access_token);

        debug!("Successfully authenticated with Infisical");
        Ok(Secret::new(auth_response.access_token))
    }
}

#[async_trait]
impl SecretsProvider for InfisicalProvider {
    fn name(&self) -> &'static str {
        "infisical"
    }

    fn locate(&self, request: &SecretRequest) -> SecretLocation {
        let path = match request.provider_label(self.name(), "path") {
            Some(custom) => custom.to_string(),
            None => {
                let base = self.config.path();
                format!("{}/{}", base.trim_end_matches('/'), request.scoped_name("/"))
            }
        };
        SecretLocation {
            path,
            field: request.provider_label(self.name(), "field").map(str::to_string),
        }
    }

    async fn read_record(&self, path: &str) -> Result<SecretRecord, SecretsError> {
        let token = self.authenticate().await?;

        let (Some(project_id), Some(environment)) =
            (&self.config.project_id, &self.config.environment)
        else {
            return Err(SecretsError::Config("Missing project_id or environment".to_string()));
        };

        let (folder, key) = split_path(path);
        let url = format!(
            "{}/api/v3/secrets/raw/{}?workspaceId={}&environment={}&secretPath={}",
            self.config.api_url(),
            urlencoding::encode(key),
            urlencoding::encode(project_id),
            urlencoding::encode(environment),
            urlencoding::encode(&folder)
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token.expose_secret()))
            .send()
            .await
            .map_err(|e| SecretsError::Backend(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let secret_response: SingleSecretResponse = response.json().await?;
                Ok(SecretRecord::from_text(&secret_response.secret.secret_value))
            }
            reqwest::StatusCode::NOT_FOUND => Err(SecretsError::NotFound(format!(
                "secret {key} not found in folder {folder}"
            ))),
            reqwest::StatusCode::UNAUTHORIZED => {
                // Next call logs in again
                *self.access_token.write().await = None;
                Err(SecretsError::Authentication(
                    "Token expired or invalid".to_string(),
                ))
            }
            reqwest::StatusCode::FORBIDDEN => Err(SecretsError::PermissionDenied(format!(
                "Access denied for secret '{key}'"
            ))),
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                Err(SecretsError::RateLimited("Rate limit exceeded".to_string()))
            }
            status => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(SecretsError::Backend(format!("HTTP {status}: {body}")))
            }
        }
    }

    async fn health_check(&self) -> Result<(), SecretsError> {
        self.authenticate().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/apps/api/DB_PASSWORD"), ("/apps/api".to_string(), "DB_PASSWORD"));
        assert_eq!(split_path("DB_PASSWORD"), ("/".to_string(), "DB_PASSWORD"));
        assert_eq!(split_path("/DB_PASSWORD"), ("/".to_string(), "DB_PASSWORD"));
    }
}
