//! GCP Secret Manager placeholder
//!
//! Configuration is validated so misconfiguration is reported first, but
//! initialization always fails and every operation returns
//! [`SecretsError::NotImplemented`].

use async_trait::async_trait;
use secrecy::SecretVec;
use tracing::info;

use crate::{
    FetchedSecret, GcpConfig, SecretInfo, SecretLocation, SecretRecord, SecretRequest,
    SecretsError, SecretsProvider,
};

const NOT_IMPLEMENTED: &str = "GCP provider is not yet implemented";

#[derive(Debug, Default)]
pub struct GcpProvider {
    config: GcpConfig,
}

impl GcpProvider {
    pub async fn new(config: GcpConfig) -> Result<Self, SecretsError> {
        let project_id = config
            .project_id
            .as_deref()
            .ok_or_else(|| SecretsError::Config("GCP_PROJECT_ID is required".to_string()))?;

        info!(project_id = %project_id, "GCP Secret Manager provider requested");
        Err(SecretsError::NotImplemented(
            "GCP provider is not yet fully implemented - use vault, openbao, aws, azure or infisical"
                .to_string(),
        ))
    }
}

#[async_trait]
impl SecretsProvider for GcpProvider {
    fn name(&self) -> &'static str {
        "gcp"
    }

    fn supports_rotation(&self) -> bool {
        false
    }

    fn locate(&self, request: &SecretRequest) -> SecretLocation {
        let project = self.config.project_id.as_deref().unwrap_or_default();
        SecretLocation {
            path: format!("projects/{project}/secrets/{}", request.secret_name),
            field: None,
        }
    }

    async fn read_record(&self, _path: &str) -> Result<SecretRecord, SecretsError> {
        Err(SecretsError::NotImplemented(NOT_IMPLEMENTED.to_string()))
    }

    async fn get_secret(&self, _request: &SecretRequest) -> Result<FetchedSecret, SecretsError> {
        Err(SecretsError::NotImplemented(NOT_IMPLEMENTED.to_string()))
    }

    async fn fetch_tracked(&self, _info: &SecretInfo) -> Result<SecretVec<u8>, SecretsError> {
        Err(SecretsError::NotImplemented(NOT_IMPLEMENTED.to_string()))
    }

    async fn check_secret_changed(&self, _info: &SecretInfo) -> Result<bool, SecretsError> {
        Err(SecretsError::NotImplemented(NOT_IMPLEMENTED.to_string()))
    }

    async fn health_check(&self) -> Result<(), SecretsError> {
        Err(SecretsError::NotImplemented(NOT_IMPLEMENTED.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fingerprint;

    #[tokio::test]
    async fn test_requires_project_id() {
        let err = GcpProvider::new(GcpConfig::default()).await.unwrap_err();
        assert!(matches!(err, SecretsError::Config(_)));
    }

    #[tokio::test]
    async fn test_every_operation_fails() {
        let provider = GcpProvider::default();
        let request = SecretRequest::new("db", "api");
        let info = SecretInfo::new("db", "p", "value", "gcp", Fingerprint::of(b""));

        assert!(!provider.supports_rotation());
        assert!(matches!(
            provider.get_secret(&request).await.unwrap_err(),
            SecretsError::NotImplemented(_)
        ));
        assert!(provider.check_secret_changed(&info).await.is_err());
        assert!(provider.fetch_tracked(&info).await.is_err());
        assert!(provider.health_check().await.is_err());
        provider.close().await;
    }
}
