//! AWS Secrets Manager provider
//!
//! Built on the AWS SDK. Credentials come from the SDK's default chain
//! (environment, profile, IAM role) unless static keys are configured.
//! Only `SecretString` payloads are supported.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_secretsmanager::Client;
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::{AwsConfig, SecretLocation, SecretRecord, SecretRequest, SecretsError, SecretsProvider};

/// AWS Secrets Manager provider
pub struct AwsProvider {
    client: Client,
}

impl AwsProvider {
    pub async fn new(config: AwsConfig) -> Result<Self, SecretsError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(ref region) = config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(ref endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some(credentials) = static_credentials(&config) {
            loader = loader.credentials_provider(credentials);
        }
        let sdk_config = loader.load().await;

        info!(
            region = ?sdk_config.region().map(|r| r.as_ref().to_string()),
            endpoint = ?config.endpoint_url,
            static_credentials = config.has_static_credentials(),
            "AWS Secrets Manager provider ready"
        );

        Ok(Self {
            client: Client::new(&sdk_config),
        })
    }
}

/// Static keys from configuration. Without both halves the SDK's default
/// credential chain applies.
fn static_credentials(config: &AwsConfig) -> Option<Credentials> {
    let (Some(access_key_id), Some(secret_access_key)) =
        (config.access_key_id.as_ref(), config.secret_access_key.as_ref())
    else {
        return None;
    };
    Some(Credentials::new(
        access_key_id.clone(),
        secret_access_key.expose_secret().clone(),
        config
            .session_token
            .as_ref()
            .map(|token| token.expose_secret().clone()),
        None,
        "secrets-plugin",
    ))
}

/// Map a Secrets Manager error code onto the provider error kinds
fn map_error_code(code: Option<&str>, message: String, path: &str) -> SecretsError {
    match code.unwrap_or_default() {
        "ResourceNotFoundException" => SecretsError::NotFound(format!("secret not found: {path}")),
        "AccessDeniedException" => SecretsError::PermissionDenied(path.to_string()),
        "UnrecognizedClientException" | "InvalidSignatureException" | "ExpiredTokenException" => {
            SecretsError::Authentication(message)
        }
        "ThrottlingException" => SecretsError::RateLimited(message),
        code => SecretsError::Backend(format!("{code} {message}").trim().to_string()),
    }
}

fn map_sdk_error<E>(err: SdkError<E>, path: &str) -> SecretsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match err {
        SdkError::ServiceError(context) => {
            let err = context.into_err();
            let message = err.message().unwrap_or_default().to_string();
            map_error_code(err.code(), message, path)
        }
        other => SecretsError::Backend(DisplayErrorContext(&other).to_string()),
    }
}

#[async_trait]
impl SecretsProvider for AwsProvider {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn locate(&self, request: &SecretRequest) -> SecretLocation {
        let path = request
            .provider_label(self.name(), "path")
            .map(str::to_string)
            .unwrap_or_else(|| request.scoped_name("/"));
        SecretLocation {
            path,
            field: request.provider_label(self.name(), "field").map(str::to_string),
        }
    }

    async fn read_record(&self, path: &str) -> Result<SecretRecord, SecretsError> {
        debug!(secret_id = %path, "Fetching secret from AWS Secrets Manager");

        let output = self
            .client
            .get_secret_value()
            .secret_id(path)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, path))?;

        match (output.secret_string(), output.secret_binary()) {
            (Some(secret), _) => Ok(SecretRecord::from_text(secret)),
            (None, Some(_)) => Err(SecretsError::Backend(format!(
                "secret {path} holds binary data, only SecretString is supported"
            ))),
            (None, None) => Err(SecretsError::NotFound(format!("secret {path} has no value"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[tokio::test]
    async fn test_default_credential_chain_is_accepted() {
        let provider = AwsProvider::new(AwsConfig {
            region: Some("us-east-1".to_string()),
            ..Default::default()
        })
        .await;
        assert!(provider.is_ok());
    }

    #[test]
    fn test_static_credentials_need_both_keys() {
        let mut config = AwsConfig {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            ..Default::default()
        };
        assert!(static_credentials(&config).is_none());

        config.secret_access_key = Some(SecretString::new("secret".to_string()));
        config.session_token = Some(SecretString::new("session".to_string()));
        let credentials = static_credentials(&config).unwrap();
        assert_eq!(credentials.access_key_id(), "AKIDEXAMPLE");
        assert_eq!(credentials.session_token(), Some("session"));
    }

    #[test]
    fn test_error_code_mapping() {
        let not_found = map_error_code(Some("ResourceNotFoundException"), "nope".into(), "db");
        assert!(not_found.is_not_found());

        assert!(matches!(
            map_error_code(Some("AccessDeniedException"), String::new(), "db"),
            SecretsError::PermissionDenied(p) if p == "db"
        ));
        assert!(matches!(
            map_error_code(Some("ExpiredTokenException"), "expired".into(), "db"),
            SecretsError::Authentication(_)
        ));
        assert!(matches!(
            map_error_code(Some("ThrottlingException"), "slow".into(), "db"),
            SecretsError::RateLimited(_)
        ));
        assert!(matches!(
            map_error_code(None, "garbage".into(), "db"),
            SecretsError::Backend(m) if m == "garbage"
        ));
    }
}
