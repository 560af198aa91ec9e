//! Trait definition for secrets providers

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretVec};

use crate::{FetchedSecret, SecretInfo, SecretLocation, SecretRecord, SecretRequest, SecretsError};

/// Trait for secrets providers
///
/// Implement this trait to add support for a new backend. A backend only has
/// to know how to map a request onto a path and how to read the record at a
/// path; value extraction and change detection are shared.
#[async_trait]
pub trait SecretsProvider: Send + Sync {
    /// Get the provider name (for logging and tracking)
    fn name(&self) -> &'static str;

    /// Prefix of the labels that override path, field and reuse
    /// (`<prefix>_path`, `<prefix>_field`, `<prefix>_reuse`).
    fn label_prefix(&self) -> &'static str {
        self.name()
    }

    /// Whether tracked secrets from this provider may be polled for changes
    fn supports_rotation(&self) -> bool {
        true
    }

    /// Resolve the backend path and explicit field for a request
    fn locate(&self, request: &SecretRequest) -> SecretLocation;

    /// Read the raw record stored at `path`
    async fn read_record(&self, path: &str) -> Result<SecretRecord, SecretsError>;

    /// Fetch the value a request refers to
    async fn get_secret(&self, request: &SecretRequest) -> Result<FetchedSecret, SecretsError> {
        let location = self.locate(request);
        let record = self.read_record(&location.path).await?;
        let extracted = record.extract(location.field.as_deref())?;
        Ok(extracted.into_fetched(location.path))
    }

    /// Re-read a tracked secret at its recorded path and field
    async fn fetch_tracked(&self, info: &SecretInfo) -> Result<SecretVec<u8>, SecretsError> {
        let record = self.read_record(&info.path).await?;
        Ok(record.extract_field(&info.field)?.value)
    }

    /// Whether the backend value differs from the last delivered one
    async fn check_secret_changed(&self, info: &SecretInfo) -> Result<bool, SecretsError> {
        let current = self.fetch_tracked(info).await?;
        Ok(!info.fingerprint.matches(current.expose_secret()))
    }

    /// Check if the provider is healthy/reachable
    async fn health_check(&self) -> Result<(), SecretsError> {
        Ok(())
    }

    /// Release backend resources. Safe to call more than once.
    async fn close(&self) {}
}
