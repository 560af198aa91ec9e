//! Error types for the secrets library

use thiserror::Error;

/// Errors that can occur when working with secret providers
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Missing or invalid provider configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The backend rejected our credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Requested path or field is absent in the backend
    #[error("Secret not found: {0}")]
    NotFound(String),

    /// Permission denied
    #[error("Permission denied for secret: {0}")]
    PermissionDenied(String),

    /// Transient I/O or protocol failure talking to the backend
    #[error("Backend error: {0}")]
    Backend(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Rate limited
    #[error("Rate limited, retry after: {0}")]
    RateLimited(String),

    /// Provider variant exists but is not implemented
    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl SecretsError {
    /// Whether the error is a configuration problem that should stop startup
    pub fn is_config(&self) -> bool {
        matches!(self, SecretsError::Config(_) | SecretsError::NotImplemented(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SecretsError::NotFound(_))
    }
}
