//! Request-facing side of the plugin
//!
//! The driver answers orchestrator lookups through the configured provider,
//! remembers what it delivered, and owns the rotation scheduler's lifecycle.

use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretVec};
use secrets::{SecretRequest, SecretsProvider};
use swarm_lib::OrchestratorClient;
use tracing::{debug, error, info};

use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::rotation::Rotator;
use crate::scheduler::{RotationScheduler, SchedulerState};
use crate::stats::RotationStats;
use crate::tracker::{Delivery, SecretTracker};

/// Name fragments that mark a secret as short-lived
const NON_REUSABLE_HINTS: [&str; 3] = ["cert", "token", "dynamic"];

/// A delivered secret value
pub struct SecretResponse {
    pub value: SecretVec<u8>,
    pub do_not_reuse: bool,
}

impl fmt::Debug for SecretResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretResponse")
            .field("value", &"[REDACTED]")
            .field("do_not_reuse", &self.do_not_reuse)
            .finish()
    }
}

/// Whether the orchestrator must ask again instead of caching the value.
///
/// An explicit `<prefix>_reuse` label wins: `false` means do not reuse, any
/// other value means reuse. Without it, names hinting at certificates,
/// tokens or dynamic credentials are not reused.
pub fn should_not_reuse(request: &SecretRequest, label_prefix: &str) -> bool {
    if let Some(reuse) = request.labels.get(&format!("{label_prefix}_reuse")) {
        return reuse.eq_ignore_ascii_case("false");
    }
    let name = request.secret_name.to_lowercase();
    NON_REUSABLE_HINTS.iter().any(|hint| name.contains(hint))
}

pub struct Driver {
    provider: Arc<dyn SecretsProvider>,
    tracker: SecretTracker,
    stats: Arc<RotationStats>,
    scheduler: Arc<RotationScheduler>,
    config: DriverConfig,
}

impl Driver {
    pub fn new(
        provider: Arc<dyn SecretsProvider>,
        orchestrator: Arc<dyn OrchestratorClient>,
        config: DriverConfig,
    ) -> Self {
        let tracker = SecretTracker::new();
        let stats = Arc::new(RotationStats::new());
        let rotator = Rotator::new(orchestrator, tracker.clone());
        let scheduler = Arc::new(RotationScheduler::new(
            Arc::clone(&provider),
            tracker.clone(),
            rotator,
            Arc::clone(&stats),
            config.rotation_interval,
        ));

        Self {
            provider,
            tracker,
            stats,
            scheduler,
            config,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn tracker(&self) -> &SecretTracker {
        &self.tracker
    }

    pub fn stats(&self) -> &RotationStats {
        &self.stats
    }

    pub fn scheduler(&self) -> &Arc<RotationScheduler> {
        &self.scheduler
    }

    pub async fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state().await
    }

    /// Look up one secret for the orchestrator.
    pub async fn get(&self, request: &SecretRequest) -> Result<SecretResponse, DriverError> {
        if request.secret_name.trim().is_empty() {
            return Err(DriverError::InvalidRequest(
                "secret name is required".to_string(),
            ));
        }

        let location = self.provider.locate(request);
        info!(
            secret = %request.secret_name,
            service = %request.service_name,
            provider = self.provider.name(),
            path = %location.path,
            field = location.field.as_deref().unwrap_or("<default>"),
            "Secret requested"
        );

        let fetched = tokio::time::timeout(
            self.config.request_timeout,
            self.provider.get_secret(request),
        )
        .await
        .map_err(|_| DriverError::Timeout(self.config.request_timeout))
        .and_then(|result| result.map_err(DriverError::from))
        .inspect_err(|e| {
            error!(secret = %request.secret_name, error = %e, "Failed to get secret")
        })?;

        if self.config.enable_rotation {
            let is_new = self
                .tracker
                .track(Delivery {
                    name: &request.secret_name,
                    path: &fetched.path,
                    field: &fetched.field,
                    service: &request.service_name,
                    provider: self.provider.name(),
                    value: fetched.value.expose_secret(),
                })
                .await;
            if is_new {
                debug!(secret = %request.secret_name, path = %fetched.path, "Tracking secret for rotation");
            }
        }

        let do_not_reuse = should_not_reuse(request, self.provider.label_prefix());
        info!(
            secret = %request.secret_name,
            field = %fetched.field,
            do_not_reuse,
            "Secret delivered"
        );

        Ok(SecretResponse {
            value: fetched.value,
            do_not_reuse,
        })
    }

    /// Launch the rotation scheduler. Returns false when rotation is
    /// disabled or the provider cannot rotate.
    pub async fn start(&self) -> bool {
        if !self.config.enable_rotation {
            info!("Secret rotation disabled");
            return false;
        }
        if !self.provider.supports_rotation() {
            info!(provider = self.provider.name(), "Provider does not support rotation");
            return false;
        }
        self.scheduler.start().await;
        true
    }

    /// Stop the scheduler, wait for an in-flight cycle, and release the
    /// provider.
    pub async fn stop(&self) {
        self.scheduler.stop().await;
        self.provider.close().await;
        info!(
            tracked = self.tracker.len().await,
            rotations = self.stats.rotations(),
            failures = self.stats.failures(),
            "Driver stopped"
        );
    }
}
