use crate::application::ports::{
    CacheInvalidator, ConnectivityProbe, ExecutorRegistry, KeyValueStore, Notifier,
};
use crate::application::services::{
    ConnectivityMonitor, PendingActionStore, SyncExecutor, SyncMetricsSnapshot,
};
use crate::domain::entities::{
    ConnectivityEvent, ConnectivitySignal, ConnectivityState, DrainReport, PendingAction,
    PendingActionDraft,
};
use crate::domain::value_objects::{PendingActionId, SyncStatus};
use crate::infrastructure::network::HttpConnectivityProbe;
use crate::infrastructure::storage::FileKeyValueStore;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Host-provided capabilities.
pub struct OfflineSyncDeps {
    pub storage: Arc<dyn KeyValueStore>,
    pub notifier: Arc<dyn Notifier>,
    pub probe: Option<Arc<dyn ConnectivityProbe>>,
    pub registry: Arc<ExecutorRegistry>,
}

impl OfflineSyncDeps {
    pub fn new(storage: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            storage,
            notifier,
            probe: None,
            registry: Arc::new(ExecutorRegistry::new()),
        }
    }

    /// File-backed storage under `storage.data_dir`, plus an HTTP probe when
    /// `connectivity.probe_url` is set.
    pub fn from_config(config: &AppConfig, notifier: Arc<dyn Notifier>) -> Result<Self, AppError> {
        let storage = Arc::new(FileKeyValueStore::new(&config.storage.data_dir));
        let mut deps = Self::new(storage, notifier);
        if let Some(url) = &config.connectivity.probe_url {
            let probe = HttpConnectivityProbe::new(url.clone(), config.connectivity.probe_timeout())?;
            deps.probe = Some(Arc::new(probe));
        }
        Ok(deps)
    }

    pub fn with_probe(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_registry(mut self, registry: Arc<ExecutorRegistry>) -> Self {
        self.registry = registry;
        self
    }
}

/// Point-in-time view for status displays.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineSnapshot {
    pub connectivity: ConnectivityState,
    pub sync_status: SyncStatus,
    pub pending: Vec<PendingAction>,
    pub metrics: SyncMetricsSnapshot,
}

/// Background tasks started by [`OfflineSyncState::start`]. Dropping the handle
/// stops them.
pub struct OfflineSyncHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl OfflineSyncHandle {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn shutdown(mut self) {
        self.abort_all();
    }

    fn abort_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for OfflineSyncHandle {
    fn drop(&mut self) {
        self.abort_all();
    }
}

/// Wires the pending action store, connectivity monitor and sync executor.
pub struct OfflineSyncState {
    config: AppConfig,
    store: Arc<PendingActionStore>,
    connectivity: Arc<ConnectivityMonitor>,
    executor: Arc<SyncExecutor>,
    registry: Arc<ExecutorRegistry>,
}

impl OfflineSyncState {
    pub fn new(config: AppConfig, deps: OfflineSyncDeps) -> Result<Arc<Self>, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let OfflineSyncDeps {
            storage,
            notifier,
            probe,
            registry,
        } = deps;

        let store = Arc::new(PendingActionStore::new(
            storage,
            Arc::clone(&notifier),
            config.storage.queue_key.clone(),
            config.sync.max_retries,
        ));
        let connectivity = Arc::new(ConnectivityMonitor::new(
            &config.connectivity,
            probe,
            Arc::clone(&notifier),
        ));
        let executor = Arc::new(SyncExecutor::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            Arc::clone(&connectivity),
            notifier,
            config.sync.action_timeout(),
        ));

        Ok(Arc::new(Self {
            config,
            store,
            connectivity,
            executor,
            registry,
        }))
    }

    /// Restores the persisted queue and drains it once if online. Returns how
    /// many actions were restored.
    pub async fn initialize(&self) -> usize {
        let restored = self.store.load_persisted().await;
        if restored > 0 && self.connectivity.is_online().await {
            self.executor.drain_queue().await;
        }
        restored
    }

    pub fn start(self: &Arc<Self>) -> OfflineSyncHandle {
        let mut tasks = vec![self.spawn_connectivity_listener()];

        if self.connectivity.has_probe() {
            tasks.push(tokio::spawn(Arc::clone(&self.connectivity).run_probe_loop()));
        }
        if self.config.sync.auto_sync {
            tasks.push(self.spawn_periodic_drain());
        }

        tracing::info!(
            target: "offline::state",
            tasks = tasks.len(),
            auto_sync = self.config.sync.auto_sync,
            "offline sync started"
        );
        OfflineSyncHandle { tasks }
    }

    fn spawn_connectivity_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let state = Arc::clone(self);
        let mut events = self.connectivity.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ConnectivityEvent::Online { .. }) => {
                        state.executor.drain_queue().await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            target: "offline::state",
                            skipped,
                            "connectivity listener lagged"
                        );
                        if state.connectivity.is_online().await {
                            state.executor.drain_queue().await;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn spawn_periodic_drain(self: &Arc<Self>) -> JoinHandle<()> {
        let state = Arc::clone(self);
        let period = self.config.sync.sync_interval();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                state.executor.drain_queue().await;
            }
        })
    }

    /// Queues `draft` and, when online, kicks off a drain in the background.
    pub async fn enqueue(self: &Arc<Self>, draft: PendingActionDraft) -> PendingActionId {
        let id = self.store.enqueue(draft).await;
        if self.connectivity.is_online().await {
            let state = Arc::clone(self);
            tokio::spawn(async move {
                state.executor.drain_queue().await;
            });
        }
        id
    }

    pub async fn drain_now(&self) -> Option<DrainReport> {
        self.executor.drain_queue().await
    }

    /// Forwards a host online/offline edge. Going online triggers a drain via
    /// the listener started in [`start`](Self::start).
    pub async fn report_connectivity(&self, signal: ConnectivitySignal) -> bool {
        self.connectivity.apply_signal(signal).await
    }

    pub fn register_invalidator(&self, invalidator: Arc<dyn CacheInvalidator>) {
        self.executor.add_invalidator(invalidator);
    }

    pub async fn snapshot(&self) -> OfflineSnapshot {
        OfflineSnapshot {
            connectivity: self.connectivity.state().await,
            sync_status: self.executor.status(),
            pending: self.store.list().await,
            metrics: self.executor.metrics(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ExecutorRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<PendingActionStore> {
        &self.store
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn executor(&self) -> &Arc<SyncExecutor> {
        &self.executor
    }
}
