use async_trait::async_trait;

/// Invalidation hook the sync executor calls after a confirmed mutation.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Drops every cached entry belonging to `resource`. Returns how many were removed.
    async fn invalidate_resource(&self, resource: &str) -> usize;
}
