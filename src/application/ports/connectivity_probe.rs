use crate::shared::error::AppError;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResponse {
    /// Whether the liveness endpoint answered with a success status.
    pub success: bool,
}

/// Lightweight network round-trip used to grade connection quality.
/// Latency is measured by the caller around `probe`.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn probe(&self) -> Result<ProbeResponse, AppError>;
}
