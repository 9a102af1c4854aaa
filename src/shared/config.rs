use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub sync: SyncConfig,
    pub connectivity: ConnectivityConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    /// Seconds between trailing drain attempts.
    pub sync_interval: u64,
    pub max_retries: u32,
    /// Seconds a single action may run before the attempt counts as failed.
    pub action_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    pub probe_url: Option<String>,
    pub probe_interval: u64,
    pub probe_timeout: u64,
    pub excellent_threshold_ms: u64,
    pub good_threshold_ms: u64,
    /// Initial online belief before the host reports the first edge.
    pub start_online: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub default_ttl: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    pub queue_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 60,
                max_retries: 3,
                action_timeout: 30,
            },
            connectivity: ConnectivityConfig::default(),
            cache: CacheConfig {
                default_ttl: 300, // 5 minutes
            },
            storage: StorageConfig {
                data_dir: default_data_dir(),
                queue_key: "offline_pending_actions".to_string(),
            },
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_url: None,
            probe_interval: 30,
            probe_timeout: 5,
            excellent_threshold_ms: 100,
            good_threshold_ms: 300,
            start_online: true,
        }
    }
}

impl SyncConfig {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout)
    }
}

impl ConnectivityConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout)
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("OFFLINE_SYNC_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Some(value) = env_u64("OFFLINE_SYNC_INTERVAL_SECS") {
            cfg.sync.sync_interval = value.max(1);
        }
        if let Some(value) = env_u64("OFFLINE_SYNC_MAX_RETRIES") {
            cfg.sync.max_retries = u32::try_from(value).unwrap_or(u32::MAX).max(1);
        }
        if let Some(value) = env_u64("OFFLINE_SYNC_ACTION_TIMEOUT_SECS") {
            cfg.sync.action_timeout = value.max(1);
        }

        if let Ok(v) = std::env::var("OFFLINE_SYNC_PROBE_URL") {
            let trimmed = v.trim();
            cfg.connectivity.probe_url = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }
        if let Some(value) = env_u64("OFFLINE_SYNC_PROBE_INTERVAL_SECS") {
            cfg.connectivity.probe_interval = value.max(1);
        }
        if let Some(value) = env_u64("OFFLINE_SYNC_PROBE_TIMEOUT_SECS") {
            cfg.connectivity.probe_timeout = value.max(1);
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_START_ONLINE") {
            cfg.connectivity.start_online = parse_bool(&v, cfg.connectivity.start_online);
        }

        if let Some(value) = env_u64("OFFLINE_SYNC_CACHE_TTL_SECS") {
            cfg.cache.default_ttl = value;
        }

        if let Ok(v) = std::env::var("OFFLINE_SYNC_DATA_DIR") {
            if !v.trim().is_empty() {
                cfg.storage.data_dir = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_QUEUE_KEY") {
            if !v.trim().is_empty() {
                cfg.storage.queue_key = v.trim().to_string();
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sync.max_retries == 0 {
            return Err("Sync max_retries must be greater than 0".to_string());
        }
        if self.sync.action_timeout == 0 {
            return Err("Sync action_timeout must be greater than 0".to_string());
        }
        if self.sync.auto_sync && self.sync.sync_interval == 0 {
            return Err("Sync sync_interval must be greater than 0".to_string());
        }
        if self.connectivity.probe_interval == 0 {
            return Err("Connectivity probe_interval must be greater than 0".to_string());
        }
        if self.connectivity.probe_timeout == 0 {
            return Err("Connectivity probe_timeout must be greater than 0".to_string());
        }
        if self.connectivity.excellent_threshold_ms >= self.connectivity.good_threshold_ms {
            return Err(
                "Connectivity excellent_threshold_ms must be below good_threshold_ms".to_string(),
            );
        }
        if self.storage.queue_key.trim().is_empty() {
            return Err("Storage queue_key cannot be empty".to_string());
        }
        Ok(())
    }
}

fn default_data_dir() -> String {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    path.push("offline-sync");
    path.to_string_lossy().into_owned()
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| parse_u64(&v))
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(())).lock().expect("lock")
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.sync.max_retries, 3);
        assert_eq!(cfg.connectivity.probe_interval, 30);
        assert_eq!(cfg.storage.queue_key, "offline_pending_actions");
    }

    #[test]
    fn validate_rejects_inverted_quality_thresholds() {
        let mut cfg = AppConfig::default();
        cfg.connectivity.excellent_threshold_ms = 400;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn from_env_applies_overrides() {
        let _guard = env_lock();
        std::env::set_var("OFFLINE_SYNC_MAX_RETRIES", "5");
        std::env::set_var("OFFLINE_SYNC_AUTO_SYNC", "off");
        std::env::set_var("OFFLINE_SYNC_PROBE_URL", " https://example.com/health ");

        let cfg = AppConfig::from_env();
        assert_eq!(cfg.sync.max_retries, 5);
        assert!(!cfg.sync.auto_sync);
        assert_eq!(
            cfg.connectivity.probe_url.as_deref(),
            Some("https://example.com/health")
        );

        std::env::remove_var("OFFLINE_SYNC_MAX_RETRIES");
        std::env::remove_var("OFFLINE_SYNC_AUTO_SYNC");
        std::env::remove_var("OFFLINE_SYNC_PROBE_URL");
    }

    #[test]
    fn parse_bool_falls_back_on_garbage() {
        assert!(parse_bool("maybe", true));
        assert!(!parse_bool("NO", true));
    }
}
