use crate::domain::entities::{DrainOutcome, DrainReport};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetricsSnapshot {
    pub total_passes: u64,
    pub total_success: u64,
    pub total_retryable: u64,
    pub total_abandoned: u64,
    pub catastrophic_failures: u64,
    pub consecutive_failed_passes: u64,
    pub last_success_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
    pub last_outcome: Option<DrainOutcome>,
    pub last_duration_ms: Option<u64>,
}

/// Running counters over drain passes, owned by the sync executor.
pub struct SyncMetrics {
    passes: AtomicU64,
    success: AtomicU64,
    retryable: AtomicU64,
    abandoned: AtomicU64,
    catastrophic: AtomicU64,
    consecutive_failed_passes: AtomicU64,
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
    last: Mutex<LastPass>,
}

#[derive(Default, Clone, Copy)]
struct LastPass {
    outcome: Option<DrainOutcome>,
    duration_ms: Option<u64>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            passes: AtomicU64::new(0),
            success: AtomicU64::new(0),
            retryable: AtomicU64::new(0),
            abandoned: AtomicU64::new(0),
            catastrophic: AtomicU64::new(0),
            consecutive_failed_passes: AtomicU64::new(0),
            last_success_ms: AtomicU64::new(0),
            last_failure_ms: AtomicU64::new(0),
            last: Mutex::new(LastPass::default()),
        }
    }

    pub fn record_pass(&self, report: &DrainReport) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.success
            .fetch_add(report.succeeded.len() as u64, Ordering::Relaxed);
        self.retryable
            .fetch_add(report.retryable.len() as u64, Ordering::Relaxed);
        self.abandoned
            .fetch_add(report.abandoned.len() as u64, Ordering::Relaxed);

        let outcome = report.outcome();
        match outcome {
            DrainOutcome::AllSucceeded => {
                self.last_success_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_failed_passes.store(0, Ordering::Relaxed);
            }
            DrainOutcome::Partial => {
                self.last_success_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.last_failure_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_failed_passes.store(0, Ordering::Relaxed);
            }
            DrainOutcome::AllFailed | DrainOutcome::RetryPending => {
                self.last_failure_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_failed_passes
                    .fetch_add(1, Ordering::Relaxed);
            }
            DrainOutcome::Empty => {}
        }

        if let Ok(mut guard) = self.last.lock() {
            guard.outcome = Some(outcome);
            guard.duration_ms = Some(report.duration.as_millis().min(u128::from(u64::MAX)) as u64);
        }
    }

    pub fn record_catastrophic(&self) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.catastrophic.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failed_passes
            .fetch_add(1, Ordering::Relaxed);
        self.last_failure_ms
            .store(current_unix_ms(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        let last = self.last.lock().map(|guard| *guard).unwrap_or_default();

        SyncMetricsSnapshot {
            total_passes: self.passes.load(Ordering::Relaxed),
            total_success: self.success.load(Ordering::Relaxed),
            total_retryable: self.retryable.load(Ordering::Relaxed),
            total_abandoned: self.abandoned.load(Ordering::Relaxed),
            catastrophic_failures: self.catastrophic.load(Ordering::Relaxed),
            consecutive_failed_passes: self.consecutive_failed_passes.load(Ordering::Relaxed),
            last_success_ms: to_option(self.last_success_ms.load(Ordering::Relaxed)),
            last_failure_ms: to_option(self.last_failure_ms.load(Ordering::Relaxed)),
            last_outcome: last.outcome,
            last_duration_ms: last.duration_ms,
        }
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn to_option(value: u64) -> Option<u64> {
    if value == 0 {
        None
    } else {
        Some(value)
    }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::PendingActionId;

    #[test]
    fn record_pass_tracks_totals_and_failure_streak() {
        let metrics = SyncMetrics::new();

        let failed = DrainReport {
            retryable: vec![PendingActionId::generate()],
            ..DrainReport::default()
        };
        metrics.record_pass(&failed);
        metrics.record_pass(&failed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_passes, 2);
        assert_eq!(snapshot.total_retryable, 2);
        assert_eq!(snapshot.consecutive_failed_passes, 2);
        assert_eq!(snapshot.last_outcome, Some(DrainOutcome::RetryPending));
        assert!(snapshot.last_success_ms.is_none());

        let ok = DrainReport {
            succeeded: vec![PendingActionId::generate(), PendingActionId::generate()],
            ..DrainReport::default()
        };
        metrics.record_pass(&ok);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_success, 2);
        assert_eq!(snapshot.consecutive_failed_passes, 0);
        assert_eq!(snapshot.last_outcome, Some(DrainOutcome::AllSucceeded));
        assert!(snapshot.last_success_ms.is_some());
    }
}
