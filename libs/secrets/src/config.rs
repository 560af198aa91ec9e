//! Configuration for secrets providers

use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;

use crate::ProviderKind;

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_secret(key: &str) -> Option<SecretString> {
    env_var(key).map(SecretString::new)
}

/// Resolved configuration for exactly one provider instance
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Vault(VaultConfig),
    OpenBao(VaultConfig),
    Aws(AwsConfig),
    Azure(AzureConfig),
    Gcp(GcpConfig),
    Infisical(InfisicalConfig),
}

impl ProviderConfig {
    /// Load the configuration of the given provider kind from the environment
    pub fn from_env(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Vault => Self::Vault(VaultConfig::from_env_with_prefix("VAULT")),
            ProviderKind::OpenBao => Self::OpenBao(VaultConfig::from_env_with_prefix("OPENBAO")),
            ProviderKind::Aws => Self::Aws(AwsConfig::from_env()),
            ProviderKind::Azure => Self::Azure(AzureConfig::from_env()),
            ProviderKind::Gcp => Self::Gcp(GcpConfig::from_env()),
            ProviderKind::Infisical => Self::Infisical(InfisicalConfig::from_env()),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Vault(_) => ProviderKind::Vault,
            Self::OpenBao(_) => ProviderKind::OpenBao,
            Self::Aws(_) => ProviderKind::Aws,
            Self::Azure(_) => ProviderKind::Azure,
            Self::Gcp(_) => ProviderKind::Gcp,
            Self::Infisical(_) => ProviderKind::Infisical,
        }
    }
}

/// Configuration for Vault and Vault-compatible (OpenBao) servers
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    /// Server address, e.g. https://vault.internal:8200
    pub address: String,
    /// Static token for `token` auth
    pub token: Option<SecretString>,
    /// `token` or `approle`
    pub auth_method: String,
    pub role_id: Option<String>,
    pub secret_id: Option<SecretString>,
    /// Secrets engine mount (default: "secret")
    pub mount_path: String,
    /// KV engine version; when unset, the `secret` mount is treated as KV v2
    pub kv_version: Option<u8>,
    /// Enterprise namespace
    pub namespace: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: None,
            auth_method: "token".to_string(),
            role_id: None,
            secret_id: None,
            mount_path: "secret".to_string(),
            kv_version: None,
            namespace: None,
            ca_cert: None,
            client_cert: None,
            client_key: None,
        }
    }
}

impl VaultConfig {
    /// Load from `<PREFIX>_ADDR`, `<PREFIX>_TOKEN`, `<PREFIX>_AUTH_METHOD`, ...
    pub fn from_env_with_prefix(prefix: &str) -> Self {
        let default = Self::default();
        let var = |suffix: &str| env_var(&format!("{prefix}_{suffix}"));

        Self {
            address: var("ADDR").unwrap_or(default.address),
            token: var("TOKEN").map(SecretString::new),
            auth_method: var("AUTH_METHOD").unwrap_or(default.auth_method),
            role_id: var("ROLE_ID"),
            secret_id: var("SECRET_ID").map(SecretString::new),
            mount_path: var("MOUNT_PATH").unwrap_or(default.mount_path),
            kv_version: var("KV_VERSION").and_then(|v| v.parse().ok()),
            namespace: var("NAMESPACE"),
            ca_cert: var("CACERT").map(PathBuf::from),
            client_cert: var("CLIENT_CERT").map(PathBuf::from),
            client_key: var("CLIENT_KEY").map(PathBuf::from),
        }
    }

    pub fn is_kv2(&self) -> bool {
        match self.kv_version {
            Some(version) => version == 2,
            None => self.mount_path == "secret",
        }
    }
}

/// Configuration for AWS Secrets Manager
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<SecretString>,
    pub session_token: Option<SecretString>,
    /// Override for the regional endpoint (local stacks, tests)
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    pub fn from_env() -> Self {
        Self {
            region: env_var("AWS_REGION").or_else(|| env_var("AWS_DEFAULT_REGION")),
            access_key_id: env_var("AWS_ACCESS_KEY_ID"),
            secret_access_key: env_secret("AWS_SECRET_ACCESS_KEY"),
            session_token: env_secret("AWS_SESSION_TOKEN"),
            endpoint_url: env_var("AWS_ENDPOINT_URL"),
        }
    }

    /// Both static keys are set; otherwise the SDK credential chain is used
    pub fn has_static_credentials(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }
}

/// Configuration for Azure Key Vault
#[derive(Debug, Clone, Deserialize)]
pub struct AzureConfig {
    pub vault_url: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    /// Pre-issued bearer token; skips the OAuth2 exchange
    pub access_token: Option<SecretString>,
    pub authority_host: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            vault_url: None,
            tenant_id: None,
            client_id: None,
            client_secret: None,
            access_token: None,
            authority_host: "https://login.microsoftonline.com".to_string(),
        }
    }
}

impl AzureConfig {
    pub fn from_env() -> Self {
        Self {
            vault_url: env_var("AZURE_VAULT_URL"),
            tenant_id: env_var("AZURE_TENANT_ID"),
            client_id: env_var("AZURE_CLIENT_ID"),
            client_secret: env_secret("AZURE_CLIENT_SECRET"),
            access_token: env_secret("AZURE_ACCESS_TOKEN"),
            authority_host: env_var("AZURE_AUTHORITY_HOST")
                .unwrap_or_else(|| Self::default().authority_host),
        }
    }

    /// Whether client credentials for the OAuth2 exchange are present
    pub fn has_client_credentials(&self) -> bool {
        self.tenant_id.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }
}

/// Configuration for GCP Secret Manager
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GcpConfig {
    pub project_id: Option<String>,
    pub credentials_path: Option<PathBuf>,
    pub credentials_json: Option<SecretString>,
}

impl GcpConfig {
    pub fn from_env() -> Self {
        Self {
            project_id: env_var("GCP_PROJECT_ID"),
            credentials_path: env_var("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            credentials_json: env_secret("GCP_CREDENTIALS_JSON"),
        }
    }
}

/// Configuration for Infisical provider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfisicalConfig {
    /// Infisical API URL (e.g., https://app.infisical.com or self-hosted URL)
    pub url: Option<String>,
    /// Client ID for machine identity authentication
    pub client_id: Option<String>,
    /// Client secret for machine identity authentication
    pub client_secret: Option<SecretString>,
    /// Project ID (workspace)
    pub project_id: Option<String>,
    /// Environment (e.g., dev, staging, prod)
    pub environment: Option<String>,
    /// Base folder that request paths are resolved under
    pub secret_path: Option<String>,
}

impl InfisicalConfig {
    /// Load Infisical configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            url: env_var("INFISICAL_URL"),
            client_id: env_var("INFISICAL_CLIENT_ID"),
            client_secret: env_secret("INFISICAL_CLIENT_SECRET"),
            project_id: env_var("INFISICAL_PROJECT_ID"),
            environment: env_var("INFISICAL_ENVIRONMENT"),
            secret_path: env_var("INFISICAL_SECRET_PATH"),
        }
    }

    /// Check if Infisical is properly configured
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some()
            && self.client_secret.is_some()
            && self.project_id.is_some()
            && self.environment.is_some()
    }

    /// Get the API URL, defaulting to Infisical Cloud
    pub fn api_url(&self) -> String {
        self.url
            .as_deref()
            .unwrap_or("https://app.infisical.com")
            .trim_end_matches('/')
            .to_string()
    }

    /// Get the base folder, defaulting to root
    pub fn path(&self) -> String {
        self.secret_path.clone().unwrap_or_else(|| "/".to_string())
    }
}
