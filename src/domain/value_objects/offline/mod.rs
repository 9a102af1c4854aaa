pub mod action_id;
pub mod action_type;
pub mod cache_key;
pub mod connection_quality;
pub mod http_method;
pub mod payload;
pub mod sync_status;

pub use action_id::PendingActionId;
pub use action_type::ActionType;
pub use cache_key::CacheKey;
pub use connection_quality::{ConnectionQuality, QualityThresholds};
pub use http_method::HttpMethod;
pub use payload::OfflinePayload;
pub use sync_status::SyncStatus;
