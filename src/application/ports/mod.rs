pub mod action_executor;
pub mod cache;
pub mod connectivity_probe;
pub mod key_value_store;
pub mod notifier;

pub use action_executor::{ActionExecutor, ExecutorRegistry, FnExecutor};
pub use cache::CacheInvalidator;
pub use connectivity_probe::{ConnectivityProbe, ProbeResponse};
pub use key_value_store::KeyValueStore;
pub use notifier::Notifier;
