//! Secrets provider implementations

mod aws;
mod azure;
mod gcp;
mod infisical;
mod vault;

pub use aws::AwsProvider;
pub use azure::{sanitize_secret_name, AzureProvider};
pub use gcp::GcpProvider;
pub use infisical::InfisicalProvider;
pub use vault::VaultProvider;
