//! # Secrets Provider Library
//!
//! One read/diff contract over several external secret stores, used by the
//! swarm secrets plugin to serve values and to detect when they change.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Arc<dyn SecretsProvider>                    │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │  1. locate(request)     → backend path + field      │   │
//! │  │  2. read_record(path)   → field map                 │   │
//! │  │  3. extract(field)      → single value              │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! │   vault · openbao · aws · azure · infisical · gcp (stub)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use secrets::{create_provider, ProviderConfig, ProviderKind, SecretRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), secrets::SecretsError> {
//!     let kind: ProviderKind = "vault".parse()?;
//!     let provider = create_provider(ProviderConfig::from_env(kind)).await?;
//!
//!     let request = SecretRequest::new("db-password", "api");
//!     let secret = provider.get_secret(&request).await?;
//!     println!("read {} from field {}", secret.path, secret.field);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod factory;
mod fingerprint;
mod provider;
mod record;
mod request;
mod tracked;

pub mod providers;

pub use config::{AwsConfig, AzureConfig, GcpConfig, InfisicalConfig, ProviderConfig, VaultConfig};
pub use error::SecretsError;
pub use factory::{create_provider, supported_providers, ProviderInfo, ProviderKind};
pub use fingerprint::Fingerprint;
pub use provider::SecretsProvider;
pub use record::{Extracted, FetchedSecret, SecretRecord, DEFAULT_FIELDS, TEXT_FIELD};
pub use request::{SecretLocation, SecretRequest};
pub use tracked::SecretInfo;
