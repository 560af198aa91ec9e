//! Lock-free rotation counters, reported in the scheduler's log lines

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

const ZERO_INTERVAL_GRACE: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Default)]
pub struct RotationStats {
    rotations: AtomicU64,
    failures: AtomicU64,
    cycles: AtomicU64,
    /// Unix millis of the last finished cycle; 0 until the first one
    last_heartbeat: AtomicI64,
}

impl RotationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark the end of a cycle
    pub fn heartbeat(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.last_heartbeat
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn last_heartbeat(&self) -> Option<DateTime<Utc>> {
        match self.last_heartbeat.load(Ordering::Relaxed) {
            0 => None,
            millis => Utc.timestamp_millis_opt(millis).single(),
        }
    }

    /// Healthy until the first cycle, then as long as the last heartbeat is
    /// younger than three intervals.
    pub fn is_healthy(&self, interval: Duration) -> bool {
        self.is_healthy_at(interval, Utc::now())
    }

    fn is_healthy_at(&self, interval: Duration, now: DateTime<Utc>) -> bool {
        let Some(last) = self.last_heartbeat() else {
            return true;
        };
        let window = if interval.is_zero() {
            ZERO_INTERVAL_GRACE
        } else {
            interval * 3
        };
        let age = now.signed_duration_since(last);
        age.to_std().map(|age| age < window).unwrap_or(true)
    }

    /// Failed rotations as a percentage of all attempts
    pub fn error_rate(&self) -> f64 {
        let failures = self.failures() as f64;
        let total = self.rotations() as f64 + failures;
        if total == 0.0 {
            0.0
        } else {
            failures / total * 100.0
        }
    }
}
