#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrets::{
    SecretLocation, SecretRecord, SecretRequest, SecretsError, SecretsProvider,
};
use swarm_lib::{
    ContainerSpec, Labels, ObjectVersion, OrchestratorClient, SecretFile, SecretReference,
    SecretSpec, ServiceSpec, SwarmError, SwarmSecret, SwarmService, TaskTemplate,
};

use secrets_plugin::tracker::{Delivery, SecretTracker};

pub const PROVIDER: &str = "static";

// ==================== PROVIDER ====================

/// In-memory backend keyed by path. The path of a request is its secret
/// name; `static_field` picks a field.
#[derive(Default)]
pub struct StaticProvider {
    records: Mutex<BTreeMap<String, String>>,
    delay: Mutex<Option<Duration>>,
    reads: AtomicUsize,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, path: &str, payload: &str) -> Self {
        self.set(path, payload);
        self
    }

    pub fn set(&self, path: &str, payload: &str) {
        self.records
            .lock()
            .unwrap()
            .insert(path.to_string(), payload.to_string());
    }

    pub fn remove(&self, path: &str) {
        self.records.lock().unwrap().remove(path);
    }

    pub fn delay_reads(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretsProvider for StaticProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn locate(&self, request: &SecretRequest) -> SecretLocation {
        SecretLocation {
            path: request.secret_name.clone(),
            field: request.provider_label(PROVIDER, "field").map(str::to_string),
        }
    }

    async fn read_record(&self, path: &str) -> Result<SecretRecord, SecretsError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let payload = self.records.lock().unwrap().get(path).cloned();
        payload
            .map(|p| SecretRecord::from_text(&p))
            .ok_or_else(|| SecretsError::NotFound(format!("secret not found at path: {path}")))
    }
}

// ==================== ORCHESTRATOR ====================

/// Swarm stand-in that applies every call to in-memory state and records
/// created and deleted object names.
#[derive(Default)]
pub struct FakeOrchestrator {
    secrets: Mutex<Vec<SwarmSecret>>,
    services: Mutex<Vec<SwarmService>>,
    created: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    fail_update_of: Mutex<Option<String>>,
    refuse_in_use_deletes: AtomicBool,
    next_id: AtomicUsize,
}

impl FakeOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_secret(&self, id: &str, name: &str, labels: Labels) {
        self.secrets.lock().unwrap().push(SwarmSecret {
            id: id.to_string(),
            version: ObjectVersion { index: 1 },
            spec: SecretSpec {
                name: name.to_string(),
                labels,
            },
        });
    }

    pub fn add_service(&self, service: SwarmService) {
        self.services.lock().unwrap().push(service);
    }

    /// Make `update_service` fail for the service with this name
    pub fn fail_update_of(&self, service: &str) {
        *self.fail_update_of.lock().unwrap() = Some(service.to_string());
    }

    pub fn clear_update_failure(&self) {
        *self.fail_update_of.lock().unwrap() = None;
    }

    /// Reject deleting a secret that a service still references, as the
    /// Swarm manager does
    pub fn refuse_in_use_deletes(&self) {
        self.refuse_in_use_deletes.store(true, Ordering::SeqCst);
    }

    pub fn secrets(&self) -> Vec<SwarmSecret> {
        self.secrets.lock().unwrap().clone()
    }

    pub fn secret_names(&self) -> Vec<String> {
        self.secrets
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.spec.name.clone())
            .collect()
    }

    pub fn service(&self, name: &str) -> Option<SwarmService> {
        self.services
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.spec.name == name)
            .cloned()
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrchestratorClient for FakeOrchestrator {
    async fn list_secrets(&self) -> Result<Vec<SwarmSecret>, SwarmError> {
        Ok(self.secrets())
    }

    async fn create_secret(
        &self,
        name: &str,
        labels: &Labels,
        _data: &[u8],
    ) -> Result<String, SwarmError> {
        let mut secrets = self.secrets.lock().unwrap();
        if secrets.iter().any(|s| s.spec.name == name) {
            return Err(SwarmError::Api {
                status: 409,
                message: format!("secret {name} already exists"),
            });
        }
        let id = format!("new-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        secrets.push(SwarmSecret {
            id: id.clone(),
            version: ObjectVersion { index: 1 },
            spec: SecretSpec {
                name: name.to_string(),
                labels: labels.clone(),
            },
        });
        self.created.lock().unwrap().push(name.to_string());
        Ok(id)
    }

    async fn delete_secret(&self, id: &str) -> Result<(), SwarmError> {
        let mut secrets = self.secrets.lock().unwrap();
        let Some(index) = secrets.iter().position(|s| s.id == id) else {
            return Err(SwarmError::Api {
                status: 404,
                message: format!("secret {id} not found"),
            });
        };
        if self.refuse_in_use_deletes.load(Ordering::SeqCst) {
            let name = secrets[index].spec.name.clone();
            let in_use_by = self.services.lock().unwrap().iter().find_map(|service| {
                service
                    .spec
                    .secret_refs()
                    .iter()
                    .any(|r| r.secret_id == id || r.secret_name == name)
                    .then(|| service.spec.name.clone())
            });
            if let Some(service) = in_use_by {
                return Err(SwarmError::Api {
                    status: 400,
                    message: format!("secret '{name}' is in use by service '{service}'"),
                });
            }
        }
        let removed = secrets.remove(index);
        self.deleted.lock().unwrap().push(removed.spec.name);
        Ok(())
    }

    async fn list_services(&self) -> Result<Vec<SwarmService>, SwarmError> {
        Ok(self.services.lock().unwrap().clone())
    }

    async fn update_service(
        &self,
        id: &str,
        version: u64,
        spec: &ServiceSpec,
    ) -> Result<Vec<String>, SwarmError> {
        if self.fail_update_of.lock().unwrap().as_deref() == Some(spec.name.as_str()) {
            return Err(SwarmError::Api {
                status: 500,
                message: "update rejected".to_string(),
            });
        }

        let mut services = self.services.lock().unwrap();
        let Some(service) = services.iter_mut().find(|s| s.id == id) else {
            return Err(SwarmError::Api {
                status: 404,
                message: format!("service {id} not found"),
            });
        };
        if service.version.index != version {
            return Err(SwarmError::Api {
                status: 500,
                message: "update out of sequence".to_string(),
            });
        }
        service.spec = spec.clone();
        service.version.index += 1;
        Ok(Vec::new())
    }
}

// ==================== HELPERS ====================

/// A service mounting one secret at `/run/secrets/<target>`
pub fn service_using(id: &str, name: &str, secret_id: &str, secret_name: &str) -> SwarmService {
    SwarmService {
        id: id.to_string(),
        version: ObjectVersion { index: 7 },
        spec: ServiceSpec {
            name: name.to_string(),
            labels: Labels::new(),
            task_template: TaskTemplate {
                container_spec: Some(ContainerSpec {
                    secrets: vec![SecretReference {
                        file: Some(SecretFile {
                            name: "db_password".to_string(),
                            uid: "0".to_string(),
                            gid: "0".to_string(),
                            mode: 0o444,
                        }),
                        secret_id: secret_id.to_string(),
                        secret_name: secret_name.to_string(),
                    }],
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        },
    }
}

/// Record a delivery of `value` for `name` to `service`
pub async fn track(tracker: &SecretTracker, name: &str, service: &str, value: &[u8]) {
    tracker
        .track(Delivery {
            name,
            path: name,
            field: "value",
            service,
            provider: PROVIDER,
            value,
        })
        .await;
}

pub fn provider(provider: StaticProvider) -> Arc<StaticProvider> {
    Arc::new(provider)
}
