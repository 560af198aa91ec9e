//! Error types for orchestrator calls

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwarmError {
    /// The socket could not be reached or the connection broke mid-request
    #[error("Failed to reach docker: {0}")]
    Connect(String),

    #[error("Docker request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx answer from the Engine API, e.g. a stale service version
    #[error("Docker API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode docker response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid docker configuration: {0}")]
    InvalidConfig(String),
}

impl SwarmError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            SwarmError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
