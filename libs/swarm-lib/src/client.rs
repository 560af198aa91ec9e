//! Orchestrator management contract

use async_trait::async_trait;

use crate::{Labels, ServiceSpec, SwarmError, SwarmSecret, SwarmService};

/// Secret and service operations the rotation protocol needs.
///
/// Implementations must be safe to share across tasks.
#[async_trait]
pub trait OrchestratorClient: Send + Sync {
    async fn list_secrets(&self) -> Result<Vec<SwarmSecret>, SwarmError>;

    /// Create a secret object and return its id
    async fn create_secret(
        &self,
        name: &str,
        labels: &Labels,
        data: &[u8],
    ) -> Result<String, SwarmError>;

    async fn delete_secret(&self, id: &str) -> Result<(), SwarmError>;

    async fn list_services(&self) -> Result<Vec<SwarmService>, SwarmError>;

    /// Replace a service spec. `version` must be the index the spec was read
    /// at; a stale index is rejected by the orchestrator.
    async fn update_service(
        &self,
        id: &str,
        version: u64,
        spec: &ServiceSpec,
    ) -> Result<Vec<String>, SwarmError>;
}
