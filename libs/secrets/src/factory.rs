//! Provider selection and construction

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::providers::{AwsProvider, AzureProvider, GcpProvider, InfisicalProvider, VaultProvider};
use crate::{ProviderConfig, SecretsError, SecretsProvider};

/// Supported backend kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Vault,
    Aws,
    Gcp,
    Azure,
    OpenBao,
    Infisical,
}

/// Human-readable description of a provider kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub auth_methods: &'static str,
    pub env_vars: &'static str,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::Vault,
        ProviderKind::Aws,
        ProviderKind::Gcp,
        ProviderKind::Azure,
        ProviderKind::OpenBao,
        ProviderKind::Infisical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Vault => "vault",
            ProviderKind::Aws => "aws",
            ProviderKind::Gcp => "gcp",
            ProviderKind::Azure => "azure",
            ProviderKind::OpenBao => "openbao",
            ProviderKind::Infisical => "infisical",
        }
    }

    pub fn info(&self) -> ProviderInfo {
        match self {
            ProviderKind::Vault => ProviderInfo {
                name: "HashiCorp Vault",
                description: "HashiCorp Vault secrets engine",
                auth_methods: "token, approle",
                env_vars: "VAULT_ADDR, VAULT_TOKEN, VAULT_MOUNT_PATH, VAULT_AUTH_METHOD, VAULT_ROLE_ID, VAULT_SECRET_ID",
            },
            ProviderKind::Aws => ProviderInfo {
                name: "AWS Secrets Manager",
                description: "Amazon Web Services Secrets Manager",
                auth_methods: "IAM roles, access keys, profiles",
                env_vars: "AWS_REGION, AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN, AWS_PROFILE",
            },
            ProviderKind::Gcp => ProviderInfo {
                name: "GCP Secret Manager",
                description: "Google Cloud Platform Secret Manager",
                auth_methods: "service account, ADC",
                env_vars: "GCP_PROJECT_ID, GOOGLE_APPLICATION_CREDENTIALS, GCP_CREDENTIALS_JSON",
            },
            ProviderKind::Azure => ProviderInfo {
                name: "Azure Key Vault",
                description: "Microsoft Azure Key Vault",
                auth_methods: "service principal, access token",
                env_vars: "AZURE_VAULT_URL, AZURE_TENANT_ID, AZURE_CLIENT_ID, AZURE_CLIENT_SECRET",
            },
            ProviderKind::OpenBao => ProviderInfo {
                name: "OpenBao",
                description: "OpenBao secrets engine (Vault-compatible)",
                auth_methods: "token, approle",
                env_vars: "OPENBAO_ADDR, OPENBAO_TOKEN, OPENBAO_MOUNT_PATH, OPENBAO_AUTH_METHOD, OPENBAO_ROLE_ID, OPENBAO_SECRET_ID",
            },
            ProviderKind::Infisical => ProviderInfo {
                name: "Infisical",
                description: "Infisical secrets platform",
                auth_methods: "machine identity (universal auth)",
                env_vars: "INFISICAL_URL, INFISICAL_CLIENT_ID, INFISICAL_CLIENT_SECRET, INFISICAL_PROJECT_ID, INFISICAL_ENVIRONMENT",
            },
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = SecretsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vault" | "hashicorp-vault" => Ok(ProviderKind::Vault),
            "aws" | "aws-secrets-manager" => Ok(ProviderKind::Aws),
            "gcp" | "gcp-secret-manager" | "google" => Ok(ProviderKind::Gcp),
            "azure" | "azure-key-vault" => Ok(ProviderKind::Azure),
            "openbao" => Ok(ProviderKind::OpenBao),
            "infisical" => Ok(ProviderKind::Infisical),
            other => Err(SecretsError::Config(format!(
                "unsupported provider type: {other}"
            ))),
        }
    }
}

/// Canonical names of every supported provider
pub fn supported_providers() -> Vec<&'static str> {
    ProviderKind::ALL.iter().map(ProviderKind::as_str).collect()
}

/// Build and initialize the provider described by `config`
pub async fn create_provider(
    config: ProviderConfig,
) -> Result<Arc<dyn SecretsProvider>, SecretsError> {
    let provider: Arc<dyn SecretsProvider> = match config {
        ProviderConfig::Vault(c) => Arc::new(VaultProvider::new(c).await?),
        ProviderConfig::OpenBao(c) => Arc::new(VaultProvider::openbao(c).await?),
        ProviderConfig::Aws(c) => Arc::new(AwsProvider::new(c).await?),
        ProviderConfig::Azure(c) => Arc::new(AzureProvider::new(c).await?),
        ProviderConfig::Gcp(c) => Arc::new(GcpProvider::new(c).await?),
        ProviderConfig::Infisical(c) => Arc::new(InfisicalProvider::new(c).await?),
    };
    Ok(provider)
}
