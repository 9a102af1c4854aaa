use crate::application::ports::connectivity_probe::ConnectivityProbe;
use crate::application::ports::notifier::{notify_best_effort, Notifier};
use crate::domain::entities::{
    ConnectivityEvent, ConnectivitySignal, ConnectivityState, Notification,
};
use crate::domain::value_objects::{ConnectionQuality, QualityThresholds};
use crate::shared::config::ConnectivityConfig;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Single source of truth for reachability plus a coarse latency grade.
pub struct ConnectivityMonitor {
    state: RwLock<ConnectivityState>,
    probe: Option<Arc<dyn ConnectivityProbe>>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<ConnectivityEvent>,
    thresholds: QualityThresholds,
    probe_interval: Duration,
    probe_timeout: Duration,
}

impl ConnectivityMonitor {
    pub fn new(
        config: &ConnectivityConfig,
        probe: Option<Arc<dyn ConnectivityProbe>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(ConnectivityState::new(config.start_online)),
            probe,
            notifier,
            events,
            thresholds: QualityThresholds::from_millis(
                config.excellent_threshold_ms,
                config.good_threshold_ms,
            ),
            probe_interval: config.probe_interval(),
            probe_timeout: config.probe_timeout(),
        }
    }

    pub fn has_probe(&self) -> bool {
        self.probe.is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> ConnectivityState {
        self.state.read().await.clone()
    }

    pub async fn is_online(&self) -> bool {
        self.state.read().await.is_online()
    }

    pub async fn apply_signal(&self, signal: ConnectivitySignal) -> bool {
        match signal {
            ConnectivitySignal::Online => self.report_online().await,
            ConnectivitySignal::Offline => self.report_offline().await,
        }
    }

    /// Handles an online edge. Returns `false` when already online.
    pub async fn report_online(&self) -> bool {
        let at = Utc::now();
        {
            let mut state = self.state.write().await;
            if state.is_online() {
                return false;
            }
            state.is_offline = false;
            state.last_online_at = Some(at);
        }

        tracing::info!(target: "offline::connectivity", "connection restored");
        let _ = self.events.send(ConnectivityEvent::Online { at });
        notify_best_effort(
            self.notifier.as_ref(),
            Notification::success(
                "Back online",
                "Connection restored. Pending changes will be synced now.",
            ),
        );

        self.probe_now().await;
        true
    }

    /// Handles an offline edge. Returns `false` when already offline.
    pub async fn report_offline(&self) -> bool {
        let at = Utc::now();
        {
            let mut state = self.state.write().await;
            if state.is_offline {
                return false;
            }
            state.is_offline = true;
            state.last_offline_at = Some(at);
            state.connection_quality = ConnectionQuality::Offline;
        }

        tracing::warn!(target: "offline::connectivity", "connection lost");
        let _ = self.events.send(ConnectivityEvent::Offline { at });
        let _ = self
            .events
            .send(ConnectivityEvent::QualityChanged(ConnectionQuality::Offline));
        notify_best_effort(
            self.notifier.as_ref(),
            Notification::warning(
                "You are offline",
                "Changes will be saved locally and synced when the connection returns.",
            ),
        );
        true
    }

    /// Runs one bounded latency probe and records the resulting grade.
    pub async fn probe_now(&self) -> ConnectionQuality {
        if !self.is_online().await {
            return ConnectionQuality::Offline;
        }

        let measured = match &self.probe {
            Some(probe) => self.measure(probe.as_ref()).await,
            // Without a probe the edge signal is all we know.
            None => ConnectionQuality::Good,
        };

        let mut state = self.state.write().await;
        if state.is_offline {
            // Went offline while the probe was in flight.
            return ConnectionQuality::Offline;
        }
        if state.connection_quality != measured {
            state.connection_quality = measured;
            drop(state);
            tracing::debug!(
                target: "offline::connectivity",
                quality = %measured,
                "connection quality changed"
            );
            let _ = self.events.send(ConnectivityEvent::QualityChanged(measured));
        }
        measured
    }

    async fn measure(&self, probe: &dyn ConnectivityProbe) -> ConnectionQuality {
        let started = Instant::now();
        match tokio::time::timeout(self.probe_timeout, probe.probe()).await {
            Ok(Ok(response)) if response.success => {
                let latency = started.elapsed();
                tracing::trace!(
                    target: "offline::connectivity",
                    latency_ms = latency.as_millis() as u64,
                    "probe completed"
                );
                ConnectionQuality::from_latency(latency, &self.thresholds)
            }
            Ok(Ok(_)) => {
                tracing::debug!(
                    target: "offline::connectivity",
                    "probe returned a non-success status"
                );
                ConnectionQuality::Poor
            }
            Ok(Err(err)) => {
                tracing::debug!(
                    target: "offline::connectivity",
                    error = %err,
                    "probe failed"
                );
                ConnectionQuality::Poor
            }
            Err(_) => {
                tracing::debug!(
                    target: "offline::connectivity",
                    timeout_ms = self.probe_timeout.as_millis() as u64,
                    "probe timed out"
                );
                ConnectionQuality::Poor
            }
        }
    }

    /// Probes every `probe_interval` while online. Runs until the task is aborted.
    pub async fn run_probe_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.probe_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if self.is_online().await {
                self.probe_now().await;
            }
        }
    }

    /// Feeds host edge events into the monitor until the sender is dropped.
    pub fn spawn_signal_listener(
        self: &Arc<Self>,
        mut signals: mpsc::Receiver<ConnectivitySignal>,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                monitor.apply_signal(signal).await;
            }
            tracing::debug!(target: "offline::connectivity", "signal listener stopped");
        })
    }
}
