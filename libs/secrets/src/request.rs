//! Secret requests as they arrive from the orchestrator

use std::collections::BTreeMap;

/// A request for a single secret value.
///
/// Read-only; lives for the duration of one lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretRequest {
    /// Orchestrator-level secret name
    pub secret_name: String,
    /// Name of the service asking for the secret (may be empty)
    pub service_name: String,
    /// Labels attached to the secret object
    pub labels: BTreeMap<String, String>,
    pub service_id: Option<String>,
    pub task_id: Option<String>,
    pub task_name: Option<String>,
    pub task_image: Option<String>,
}

impl SecretRequest {
    pub fn new(secret_name: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            secret_name: secret_name.into(),
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Label value for `<prefix>_<suffix>`, e.g. `vault_path`.
    pub fn provider_label(&self, prefix: &str, suffix: &str) -> Option<&str> {
        self.labels
            .get(&format!("{prefix}_{suffix}"))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// `<service>/<name>` when a service is known, otherwise the bare name.
    pub fn scoped_name(&self, separator: &str) -> String {
        if self.service_name.is_empty() {
            self.secret_name.clone()
        } else {
            format!("{}{}{}", self.service_name, separator, self.secret_name)
        }
    }
}

/// Where a secret lives in the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretLocation {
    pub path: String,
    /// Explicit field requested through labels, if any
    pub field: Option<String>,
}
