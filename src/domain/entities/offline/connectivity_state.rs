use crate::domain::value_objects::ConnectionQuality;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityState {
    pub is_offline: bool,
    pub last_online_at: Option<DateTime<Utc>>,
    pub last_offline_at: Option<DateTime<Utc>>,
    pub connection_quality: ConnectionQuality,
}

impl ConnectivityState {
    pub fn new(start_online: bool) -> Self {
        Self {
            is_offline: !start_online,
            last_online_at: None,
            last_offline_at: None,
            // Graded properly by the first probe.
            connection_quality: if start_online {
                ConnectionQuality::Good
            } else {
                ConnectionQuality::Offline
            },
        }
    }

    pub fn is_online(&self) -> bool {
        !self.is_offline
    }
}

/// Platform edge event fed in by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivitySignal {
    Online,
    Offline,
}

/// Broadcast to subscribers of the connectivity monitor.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectivityEvent {
    Online { at: DateTime<Utc> },
    Offline { at: DateTime<Utc> },
    QualityChanged(ConnectionQuality),
}
