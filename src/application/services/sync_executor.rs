use crate::application::ports::action_executor::ExecutorRegistry;
use crate::application::ports::cache::CacheInvalidator;
use crate::application::ports::notifier::{notify_best_effort, Notifier};
use crate::application::services::connectivity_monitor::ConnectivityMonitor;
use crate::application::services::pending_action_store::PendingActionStore;
use crate::application::services::sync_metrics::{SyncMetrics, SyncMetricsSnapshot};
use crate::domain::entities::{DrainOutcome, DrainReport, Notification, PendingAction};
use crate::domain::value_objects::{PendingActionId, SyncStatus};
use crate::shared::error::AppError;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// Drains the pending action store in insertion order, one action at a time.
pub struct SyncExecutor {
    store: Arc<PendingActionStore>,
    registry: Arc<ExecutorRegistry>,
    connectivity: Arc<ConnectivityMonitor>,
    notifier: Arc<dyn Notifier>,
    invalidators: RwLock<Vec<Arc<dyn CacheInvalidator>>>,
    status: Mutex<SyncStatus>,
    metrics: SyncMetrics,
    action_timeout: Duration,
}

/// Keeps `status` consistent if a drain future is dropped mid-pass.
struct SyncingGuard<'a> {
    executor: &'a SyncExecutor,
    finished: bool,
}

impl SyncingGuard<'_> {
    fn finish(mut self, status: SyncStatus) {
        *self.executor.lock_status() = status;
        self.finished = true;
    }
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.executor.lock_status() = SyncStatus::Idle;
        }
    }
}

impl SyncExecutor {
    pub fn new(
        store: Arc<PendingActionStore>,
        registry: Arc<ExecutorRegistry>,
        connectivity: Arc<ConnectivityMonitor>,
        notifier: Arc<dyn Notifier>,
        action_timeout: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            connectivity,
            notifier,
            invalidators: RwLock::new(Vec::new()),
            status: Mutex::new(SyncStatus::Idle),
            metrics: SyncMetrics::new(),
            action_timeout,
        }
    }

    pub fn add_invalidator(&self, invalidator: Arc<dyn CacheInvalidator>) {
        match self.invalidators.write() {
            Ok(mut guard) => guard.push(invalidator),
            Err(poisoned) => poisoned.into_inner().push(invalidator),
        }
    }

    pub fn status(&self) -> SyncStatus {
        *self.lock_status()
    }

    pub fn metrics(&self) -> SyncMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Drains the queue if online, it is non-empty and no drain is already
    /// running. Actions queued during a pass get a trailing pass before the
    /// status returns to idle. Returns `None` when it did not run or failed
    /// outright.
    pub async fn drain_queue(&self) -> Option<DrainReport> {
        if !self.connectivity.is_online().await {
            tracing::trace!(target: "offline::sync", "skipping drain while offline");
            return None;
        }
        if self.store.is_empty().await {
            return None;
        }

        let guard = {
            let mut status = self.lock_status();
            if *status == SyncStatus::Syncing {
                tracing::debug!(target: "offline::sync", "drain already in progress");
                return None;
            }
            *status = SyncStatus::Syncing;
            SyncingGuard {
                executor: self,
                finished: false,
            }
        };

        match AssertUnwindSafe(self.run_passes()).catch_unwind().await {
            Ok(report) => {
                guard.finish(SyncStatus::Idle);
                Some(report)
            }
            Err(panic) => {
                self.metrics.record_catastrophic();
                tracing::error!(
                    target: "offline::sync",
                    error = %panic_message(panic.as_ref()),
                    "drain pass aborted"
                );
                notify_best_effort(
                    self.notifier.as_ref(),
                    Notification::error(
                        "Sync error",
                        "Something went wrong while syncing. Pending changes were kept.",
                    ),
                );
                guard.finish(SyncStatus::Error);
                None
            }
        }
    }

    /// Runs a pass, then one more for as long as actions were queued while the
    /// previous pass ran. Actions a pass already attempted never trigger another.
    async fn run_passes(&self) -> DrainReport {
        let mut total: Option<DrainReport> = None;

        loop {
            let snapshot = self.store.list().await;
            let seen: HashSet<PendingActionId> =
                snapshot.iter().map(|action| action.id.clone()).collect();

            let report = self.run_pass(snapshot).await;
            self.metrics.record_pass(&report);
            tracing::info!(
                target: "offline::sync",
                succeeded = report.succeeded.len(),
                retryable = report.retryable.len(),
                abandoned = report.abandoned.len(),
                skipped = report.skipped,
                deferred = report.deferred,
                duration_ms = report.duration.as_millis() as u64,
                "drain pass completed"
            );
            self.notify_summary(&report);

            let interrupted = report.interrupted();
            match total.as_mut() {
                Some(total) => total.absorb(report),
                None => total = Some(report),
            }

            if interrupted || !self.connectivity.is_online().await {
                break;
            }
            let queued_meanwhile = self
                .store
                .list()
                .await
                .iter()
                .any(|action| !seen.contains(&action.id));
            if !queued_meanwhile {
                break;
            }
            tracing::debug!(
                target: "offline::sync",
                "actions queued during the pass; running a trailing pass"
            );
        }

        total.unwrap_or_default()
    }

    async fn run_pass(&self, snapshot: Vec<PendingAction>) -> DrainReport {
        let started = Instant::now();
        let total = snapshot.len();
        let mut report = DrainReport::default();

        for (position, action) in snapshot.into_iter().enumerate() {
            if !self.connectivity.is_online().await {
                report.deferred = total - position;
                tracing::info!(
                    target: "offline::sync",
                    deferred = report.deferred,
                    "connection lost mid-pass; leaving remaining actions queued"
                );
                break;
            }
            if !self.store.contains(&action.id).await {
                report.skipped += 1;
                continue;
            }

            match self.attempt(&action).await {
                Ok(_) => {
                    self.store.dequeue(&action.id).await;
                    self.invalidate_for(&action).await;
                    tracing::debug!(
                        target: "offline::sync",
                        action_id = %action.id,
                        action_type = %action.action_type,
                        "pending action synced"
                    );
                    report.succeeded.push(action.id);
                }
                Err(err) => self.handle_failure(action, err, &mut report).await,
            }
        }

        report.duration = started.elapsed();
        report
    }

    async fn handle_failure(&self, action: PendingAction, err: AppError, report: &mut DrainReport) {
        let Some(updated) = self.store.record_failure(&action.id).await else {
            // Removed by someone else while the attempt was running.
            report.skipped += 1;
            return;
        };

        if updated.is_exhausted() {
            self.store.dequeue(&updated.id).await;
            tracing::error!(
                target: "offline::sync",
                action_id = %updated.id,
                action_type = %updated.action_type,
                attempts = updated.retry_count,
                error = %err,
                "pending action abandoned"
            );
            notify_best_effort(
                self.notifier.as_ref(),
                Notification::error(
                    "Action dropped",
                    format!(
                        "{} failed after {} attempt(s) and was discarded: {}",
                        updated.describe(),
                        updated.retry_count,
                        err
                    ),
                ),
            );
            report.abandoned.push(updated.id);
        } else {
            tracing::warn!(
                target: "offline::sync",
                action_id = %updated.id,
                action_type = %updated.action_type,
                retry_count = updated.retry_count,
                max_retries = updated.max_retries,
                transient = err.is_transient(),
                error = %err,
                "pending action failed; will retry"
            );
            report.retryable.push(updated.id);
        }
    }

    async fn attempt(&self, action: &PendingAction) -> Result<Value, AppError> {
        let executor = self
            .registry
            .resolve(&action.action_type)
            .ok_or_else(|| AppError::ExecutorNotFound(action.action_type.to_string()))?;

        // The call sits inside the async block so a panic while building the
        // future is caught as well.
        let call = AssertUnwindSafe(async { executor.execute(action).await }).catch_unwind();

        match tokio::time::timeout(self.action_timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(AppError::execution(format!(
                "executor panicked: {}",
                panic_message(panic.as_ref())
            ))),
            Err(_) => Err(AppError::Timeout(format!(
                "action {} did not finish within {}ms",
                action.id,
                self.action_timeout.as_millis()
            ))),
        }
    }

    async fn invalidate_for(&self, action: &PendingAction) {
        let Some(resource) = action.endpoint.as_deref() else {
            return;
        };
        let invalidators = match self.invalidators.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for invalidator in invalidators {
            invalidator.invalidate_resource(resource).await;
        }
    }

    fn notify_summary(&self, report: &DrainReport) {
        let succeeded = report.succeeded.len();
        let failed = report.retryable.len() + report.abandoned.len();

        let notification = match report.outcome() {
            DrainOutcome::Empty => return,
            DrainOutcome::AllSucceeded => Notification::success(
                "Sync complete",
                format!("{succeeded} pending action(s) synced."),
            ),
            DrainOutcome::AllFailed => Notification::error(
                "Sync failed",
                format!("{failed} action(s) could not be synced and were discarded."),
            ),
            DrainOutcome::Partial => Notification::warning(
                "Partial sync",
                format!(
                    "{succeeded} action(s) synced, {failed} failed. {} will be retried.",
                    report.retryable.len()
                ),
            ),
            DrainOutcome::RetryPending => Notification::error(
                "Sync failed, will retry",
                format!(
                    "{} action(s) could not be synced and will be retried.",
                    report.retryable.len()
                ),
            ),
        };

        notify_best_effort(self.notifier.as_ref(), notification);
    }

    fn lock_status(&self) -> MutexGuard<'_, SyncStatus> {
        self.status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
