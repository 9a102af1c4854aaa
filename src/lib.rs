//! Offline-first mutation queue with connectivity tracking, background sync
//! and a single-flight read cache.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::ports::{
    ActionExecutor, CacheInvalidator, ConnectivityProbe, ExecutorRegistry, FnExecutor,
    KeyValueStore, Notifier, ProbeResponse,
};
pub use application::services::{
    CacheStats, ConnectivityMonitor, DataLoader, PendingActionStore, SyncExecutor,
    SyncMetricsSnapshot,
};
pub use domain::entities::{
    ConnectivityEvent, ConnectivitySignal, ConnectivityState, DrainOutcome, DrainReport,
    Notification, PendingAction, PendingActionDraft, Severity,
};
pub use domain::value_objects::{
    ActionType, CacheKey, ConnectionQuality, HttpMethod, OfflinePayload, PendingActionId,
    SyncStatus,
};
pub use shared::{AppConfig, AppError, Result};
pub use state::{OfflineSnapshot, OfflineSyncDeps, OfflineSyncHandle, OfflineSyncState};
