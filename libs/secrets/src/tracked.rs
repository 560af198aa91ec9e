//! Tracked secret records shared by providers and the rotation engine

use chrono::{DateTime, Utc};

use crate::Fingerprint;

/// What the plugin remembers about a secret it has delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretInfo {
    /// Logical orchestrator secret name (unique key)
    pub name: String,
    /// Resolved backend path
    pub path: String,
    /// Field the value was extracted from
    pub field: String,
    /// Services that requested this secret, in first-seen order
    pub services: Vec<String>,
    /// Fingerprint of the value most recently delivered to the orchestrator
    pub fingerprint: Fingerprint,
    pub last_updated: DateTime<Utc>,
    /// Provider that owns the backend path
    pub provider: String,
    /// Name of the live orchestrator secret object; the logical name until
    /// the first successful rotation, then the latest versioned name
    pub object_name: String,
}

impl SecretInfo {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        field: impl Into<String>,
        provider: impl Into<String>,
        fingerprint: Fingerprint,
    ) -> Self {
        let name = name.into();
        Self {
            object_name: name.clone(),
            name,
            path: path.into(),
            field: field.into(),
            services: Vec::new(),
            fingerprint,
            last_updated: Utc::now(),
            provider: provider.into(),
        }
    }

    /// Record a consumer. Returns true if it was not known before.
    pub fn add_service(&mut self, service: &str) -> bool {
        if service.is_empty() || self.services.iter().any(|s| s == service) {
            return false;
        }
        self.services.push(service.to_string());
        true
    }
}
