use crate::shared::error::AppError;
use async_trait::async_trait;

/// Durable string slots addressed by key. The pending action queue lives in one
/// of them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn write(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}
