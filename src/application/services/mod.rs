pub mod connectivity_monitor;
pub mod data_loader;
pub mod pending_action_store;
pub mod sync_executor;
pub mod sync_metrics;

pub use connectivity_monitor::ConnectivityMonitor;
pub use data_loader::{CacheStats, DataLoader};
pub use pending_action_store::PendingActionStore;
pub use sync_executor::SyncExecutor;
pub use sync_metrics::{SyncMetrics, SyncMetricsSnapshot};
