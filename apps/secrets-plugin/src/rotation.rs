//! Versioned-object rotation against the swarm
//!
//! A rotation never edits a secret object in place (swarm secrets are
//! immutable). It creates `<name>-<stamp>`, moves every consuming service
//! onto it, and only then removes the objects it supersedes.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use secrecy::ExposeSecret;
use secrets::{Fingerprint, SecretInfo, SecretsProvider};
use swarm_lib::{OrchestratorClient, SwarmSecret};
use tracing::{error, info, warn};

use crate::constants::{ROTATED_AT_LABEL, ROTATION_SOURCE_LABEL};
use crate::error::{CleanupError, RotationError};
use crate::tracker::SecretTracker;

/// Result of a completed rotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationOutcome {
    pub secret: String,
    pub new_object: String,
    pub new_object_id: String,
    pub updated_services: Vec<String>,
    /// Superseded objects that could not be removed
    pub cleanup_errors: Vec<CleanupError>,
}

/// Runs the create, propagate, cleanup sequence for changed secrets
pub struct Rotator {
    orchestrator: Arc<dyn OrchestratorClient>,
    tracker: SecretTracker,
    last_stamp: AtomicI64,
}

impl Rotator {
    pub fn new(orchestrator: Arc<dyn OrchestratorClient>, tracker: SecretTracker) -> Self {
        Self {
            orchestrator,
            tracker,
            last_stamp: AtomicI64::new(0),
        }
    }

    /// Unix seconds, strictly increasing across calls
    fn next_stamp(&self) -> i64 {
        let now = Utc::now().timestamp();
        let previous = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        now.max(previous + 1)
    }

    /// Rotate one tracked secret onto the value currently in the backend.
    pub async fn rotate(
        &self,
        provider: &dyn SecretsProvider,
        info: &SecretInfo,
    ) -> Result<RotationOutcome, RotationError> {
        let secret = info.name.clone();

        let value = provider
            .fetch_tracked(info)
            .await
            .map_err(|source| RotationError::Fetch {
                secret: secret.clone(),
                source,
            })?;
        let fingerprint = Fingerprint::of(value.expose_secret());

        let objects = self
            .orchestrator
            .list_secrets()
            .await
            .map_err(|source| RotationError::Lookup {
                secret: secret.clone(),
                source,
            })?;

        let current = objects
            .iter()
            .find(|s| s.name() == info.object_name)
            .ok_or_else(|| RotationError::SecretObjectMissing {
                secret: secret.clone(),
                object: info.object_name.clone(),
            })?;

        // The live object, the original logical object, and leftovers of
        // earlier attempts that were interrupted before cleanup
        let superseded: Vec<&SwarmSecret> = objects
            .iter()
            .filter(|s| {
                s.name() == info.object_name
                    || s.name() == info.name
                    || s.label(ROTATION_SOURCE_LABEL) == Some(info.name.as_str())
            })
            .collect();

        let new_object = format!("{}-{}", info.name, self.next_stamp());
        let labels = rotated_labels(&current.spec.labels, &info.name);

        let new_object_id = self
            .orchestrator
            .create_secret(&new_object, &labels, value.expose_secret())
            .await
            .map_err(|source| RotationError::Create {
                object: new_object.clone(),
                source,
            })?;
        info!(secret = %secret, object = %new_object, "Created rotated secret object");

        let updated_services = match self
            .propagate(info, &superseded, &new_object, &new_object_id)
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                error!(secret = %secret, error = %e, "Rotation failed during service update");
                self.discard(&new_object, &new_object_id).await;
                return Err(e);
            }
        };

        let mut cleanup_errors = Vec::new();
        for old in &superseded {
            match self.orchestrator.delete_secret(&old.id).await {
                Ok(()) => info!(secret = %secret, object = %old.name(), "Removed superseded secret object"),
                Err(e) => {
                    let cleanup = CleanupError {
                        secret: old.name().to_string(),
                        reason: e.to_string(),
                    };
                    warn!(error = %cleanup, "Superseded secret object left in place");
                    cleanup_errors.push(cleanup);
                }
            }
        }

        self.tracker
            .update_after_rotation(&info.name, &new_object, fingerprint)
            .await;

        info!(
            secret = %secret,
            object = %new_object,
            services = updated_services.len(),
            "Secret rotation completed"
        );

        Ok(RotationOutcome {
            secret,
            new_object,
            new_object_id,
            updated_services,
            cleanup_errors,
        })
    }

    /// Point every service that references a superseded object at the new
    /// one. Stops at the first failure.
    async fn propagate(
        &self,
        info: &SecretInfo,
        superseded: &[&SwarmSecret],
        new_object: &str,
        new_object_id: &str,
    ) -> Result<Vec<String>, RotationError> {
        let old_names: HashSet<&str> = superseded.iter().map(|s| s.name()).collect();
        let old_ids: HashSet<&str> = superseded.iter().map(|s| s.id.as_str()).collect();
        let is_superseded = |name: &str, id: &str| old_names.contains(name) || old_ids.contains(id);

        let services = self
            .orchestrator
            .list_services()
            .await
            .map_err(|source| RotationError::Propagation {
                secret: info.name.clone(),
                service: None,
                source,
            })?;

        let rotated_at = Utc::now().timestamp().to_string();
        let mut updated = Vec::new();

        for service in services {
            let uses_secret = service
                .spec
                .secret_refs()
                .iter()
                .any(|r| is_superseded(&r.secret_name, &r.secret_id));
            if !uses_secret {
                continue;
            }

            let service_name = if service.spec.name.is_empty() {
                service.id.clone()
            } else {
                service.spec.name.clone()
            };

            let mut spec = service.spec.clone();
            if let Some(refs) = spec.secret_refs_mut() {
                for reference in refs.iter_mut() {
                    if is_superseded(&reference.secret_name, &reference.secret_id) {
                        reference.secret_name = new_object.to_string();
                        reference.secret_id = new_object_id.to_string();
                    }
                }
            }
            spec.labels
                .insert(ROTATED_AT_LABEL.to_string(), rotated_at.clone());

            let warnings = self
                .orchestrator
                .update_service(&service.id, service.version.index, &spec)
                .await
                .map_err(|source| RotationError::Propagation {
                    secret: info.name.clone(),
                    service: Some(service_name.clone()),
                    source,
                })?;

            for warning in warnings {
                warn!(service = %service_name, warning = %warning, "Service update warning");
            }
            info!(secret = %info.name, service = %service_name, object = %new_object, "Service moved to rotated secret");
            updated.push(service_name);
        }

        Ok(updated)
    }

    /// Compensating delete of a freshly created object
    async fn discard(&self, name: &str, id: &str) {
        if let Err(e) = self.orchestrator.delete_secret(id).await {
            let cleanup = CleanupError {
                secret: name.to_string(),
                reason: e.to_string(),
            };
            warn!(error = %cleanup, "Failed to discard secret object after rotation failure");
        } else {
            info!(object = %name, "Discarded secret object after rotation failure");
        }
    }
}

/// Labels of the existing object plus the rotation-source marker
pub fn rotated_labels(
    current: &BTreeMap<String, String>,
    logical_name: &str,
) -> BTreeMap<String, String> {
    let mut labels = current.clone();
    labels.insert(ROTATION_SOURCE_LABEL.to_string(), logical_name.to_string());
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoOrchestrator;

    #[async_trait::async_trait]
    impl OrchestratorClient for NoOrchestrator {
        async fn list_secrets(&self) -> Result<Vec<SwarmSecret>, swarm_lib::SwarmError> {
            Ok(Vec::new())
        }
        async fn create_secret(
            &self,
            _: &str,
            _: &swarm_lib::Labels,
            _: &[u8],
        ) -> Result<String, swarm_lib::SwarmError> {
            Ok(String::new())
        }
        async fn delete_secret(&self, _: &str) -> Result<(), swarm_lib::SwarmError> {
            Ok(())
        }
        async fn list_services(&self) -> Result<Vec<swarm_lib::SwarmService>, swarm_lib::SwarmError> {
            Ok(Vec::new())
        }
        async fn update_service(
            &self,
            _: &str,
            _: u64,
            _: &swarm_lib::ServiceSpec,
        ) -> Result<Vec<String>, swarm_lib::SwarmError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_stamps_strictly_increase() {
        let rotator = Rotator::new(Arc::new(NoOrchestrator), SecretTracker::new());
        let first = rotator.next_stamp();
        let second = rotator.next_stamp();
        let third = rotator.next_stamp();
        assert!(first >= Utc::now().timestamp() - 1);
        assert!(second > first);
        assert!(third > second);
    }

    #[test]
    fn test_rotated_labels_keep_existing() {
        let current = BTreeMap::from([("env".to_string(), "prod".to_string())]);
        let labels = rotated_labels(&current, "db-pass");
        assert_eq!(labels.get("env").map(String::as_str), Some("prod"));
        assert_eq!(
            labels.get(ROTATION_SOURCE_LABEL).map(String::as_str),
            Some("db-pass")
        );
    }
}
