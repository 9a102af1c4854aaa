pub mod offline;

pub use offline::{
    ActionType, CacheKey, ConnectionQuality, HttpMethod, OfflinePayload, PendingActionId,
    QualityThresholds, SyncStatus,
};
