//! Periodic change detection over the tracked secrets

use std::sync::Arc;
use std::time::Duration;

use secrets::SecretsProvider;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::rotation::Rotator;
use crate::stats::RotationStats;
use crate::tracker::SecretTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Tally of one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Entries whose provider was asked for changes
    pub checked: usize,
    pub unchanged: usize,
    pub rotated: usize,
    /// Rotations that failed
    pub failed: usize,
    /// Entries not checked this cycle, or whose check errored
    pub skipped: usize,
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct RotationScheduler {
    provider: Arc<dyn SecretsProvider>,
    tracker: SecretTracker,
    rotator: Rotator,
    stats: Arc<RotationStats>,
    interval: Duration,
    running: Mutex<Option<Running>>,
}

impl RotationScheduler {
    pub fn new(
        provider: Arc<dyn SecretsProvider>,
        tracker: SecretTracker,
        rotator: Rotator,
        stats: Arc<RotationStats>,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            tracker,
            rotator,
            stats,
            interval,
            running: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn state(&self) -> SchedulerState {
        match *self.running.lock().await {
            Some(_) => SchedulerState::Running,
            None => SchedulerState::Stopped,
        }
    }

    /// Spawn the timer loop. Starting a running scheduler is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let scheduler = Arc::clone(self);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { scheduler.run(token).await });

        *running = Some(Running { cancel, handle });
    }

    /// Cancel the loop and wait for an in-flight cycle to finish.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };
        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            error!(error = %e, "Rotation scheduler task failed");
        }
    }

    /// Timer loop. Cancellation is only observed between cycles.
    pub async fn run(&self, cancel: CancellationToken) {
        let period = if self.interval.is_zero() {
            crate::config::DEFAULT_ROTATION_INTERVAL
        } else {
            self.interval
        };
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            provider = self.provider.name(),
            interval_secs = period.as_secs(),
            "Rotation scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.run_cycle().await;
                    info!(
                        checked = report.checked,
                        rotated = report.rotated,
                        failed = report.failed,
                        skipped = report.skipped,
                        total_rotations = self.stats.rotations(),
                        error_rate = self.stats.error_rate(),
                        healthy = self.stats.is_healthy(period),
                        "Rotation cycle finished"
                    );
                }
            }
        }

        info!("Rotation scheduler stopped");
    }

    /// Check every tracked entry once, rotating the ones that changed.
    pub async fn run_cycle(&self) -> CycleReport {
        let snapshot = self.tracker.snapshot().await;
        let mut report = CycleReport::default();
        debug!(tracked = snapshot.len(), "Checking tracked secrets for changes");

        for info in snapshot {
            if !self.provider.supports_rotation() || info.provider != self.provider.name() {
                report.skipped += 1;
                continue;
            }
            report.checked += 1;

            match self.provider.check_secret_changed(&info).await {
                Ok(false) => report.unchanged += 1,
                Ok(true) => {
                    info!(secret = %info.name, path = %info.path, "Secret changed in backend, rotating");
                    match self.rotator.rotate(self.provider.as_ref(), &info).await {
                        Ok(_) => {
                            self.stats.record_rotation();
                            report.rotated += 1;
                        }
                        Err(e) => {
                            self.stats.record_failure();
                            error!(secret = %info.name, error = %e, "Secret rotation failed");
                            report.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(secret = %info.name, error = %e, "Failed to check secret for changes");
                    report.skipped += 1;
                }
            }
        }

        self.stats.heartbeat();
        report
    }
}
