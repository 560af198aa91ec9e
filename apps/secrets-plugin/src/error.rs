use std::time::Duration;

use secrets::SecretsError;
use swarm_lib::SwarmError;
use thiserror::Error;

/// Failures of a single `get` call
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to get secret: {0}")]
    Provider(#[from] SecretsError),

    #[error("secret lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Why a rotation did not complete
#[derive(Debug, Error)]
pub enum RotationError {
    /// Nothing was mutated
    #[error("failed to fetch current value of {secret}: {source}")]
    Fetch {
        secret: String,
        #[source]
        source: SecretsError,
    },

    /// Nothing was mutated
    #[error("failed to list secret objects while rotating {secret}: {source}")]
    Lookup {
        secret: String,
        #[source]
        source: SwarmError,
    },

    /// Nothing was mutated
    #[error("secret object {object} for {secret} not found")]
    SecretObjectMissing { secret: String, object: String },

    /// Nothing was mutated
    #[error("failed to create secret object {object}: {source}")]
    Create {
        object: String,
        #[source]
        source: SwarmError,
    },

    /// The new object was discarded; services updated before the failure
    /// keep pointing at it.
    #[error(
        "failed to propagate {secret} to service {}: {source}",
        .service.as_deref().unwrap_or("<service list>")
    )]
    Propagation {
        secret: String,
        /// None when the service list itself could not be read
        service: Option<String>,
        #[source]
        source: SwarmError,
    },
}

/// A secret object that could not be removed. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to remove secret object {secret}: {reason}")]
pub struct CleanupError {
    pub secret: String,
    pub reason: String,
}
