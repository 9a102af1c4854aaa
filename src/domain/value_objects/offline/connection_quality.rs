use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionQuality {
    Excellent,
    Good,
    Poor,
    Offline,
}

/// Latency cut-offs used to grade a successful probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityThresholds {
    pub excellent_below: Duration,
    pub good_below: Duration,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            excellent_below: Duration::from_millis(100),
            good_below: Duration::from_millis(300),
        }
    }
}

impl QualityThresholds {
    pub fn from_millis(excellent_below: u64, good_below: u64) -> Self {
        Self {
            excellent_below: Duration::from_millis(excellent_below),
            good_below: Duration::from_millis(good_below),
        }
    }
}

impl ConnectionQuality {
    pub fn from_latency(latency: Duration, thresholds: &QualityThresholds) -> Self {
        if latency < thresholds.excellent_below {
            ConnectionQuality::Excellent
        } else if latency < thresholds.good_below {
            ConnectionQuality::Good
        } else {
            ConnectionQuality::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionQuality::Excellent => "excellent",
            ConnectionQuality::Good => "good",
            ConnectionQuality::Poor => "poor",
            ConnectionQuality::Offline => "offline",
        }
    }
}

impl fmt::Display for ConnectionQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_grades_follow_thresholds() {
        let t = QualityThresholds::default();
        assert_eq!(
            ConnectionQuality::from_latency(Duration::from_millis(50), &t),
            ConnectionQuality::Excellent
        );
        assert_eq!(
            ConnectionQuality::from_latency(Duration::from_millis(200), &t),
            ConnectionQuality::Good
        );
        assert_eq!(
            ConnectionQuality::from_latency(Duration::from_millis(300), &t),
            ConnectionQuality::Poor
        );
        assert_eq!(
            ConnectionQuality::from_latency(Duration::from_millis(500), &t),
            ConnectionQuality::Poor
        );
    }
}
