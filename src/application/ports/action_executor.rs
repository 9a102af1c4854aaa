use crate::domain::entities::PendingAction;
use crate::domain::value_objects::ActionType;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// Performs the remote effect of a queued action.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, action: &PendingAction) -> Result<Value, AppError>;
}

/// Adapts an async closure into an [`ActionExecutor`].
pub struct FnExecutor<F> {
    func: F,
}

impl<F, Fut> FnExecutor<F>
where
    F: Fn(PendingAction) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, AppError>> + Send + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> ActionExecutor for FnExecutor<F>
where
    F: Fn(PendingAction) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, AppError>> + Send + 'static,
{
    async fn execute(&self, action: &PendingAction) -> Result<Value, AppError> {
        (self.func)(action.clone()).await
    }
}

/// Capability table mapping an action type to the executor that performs it.
/// Registered by the host at startup, consulted by the drain loop on every
/// attempt so executors survive a reload of the persisted queue.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: RwLock<HashMap<ActionType, Arc<dyn ActionExecutor>>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `executor` for `action_type`, returning the one it replaced.
    pub fn register(
        &self,
        action_type: ActionType,
        executor: Arc<dyn ActionExecutor>,
    ) -> Option<Arc<dyn ActionExecutor>> {
        match self.executors.write() {
            Ok(mut guard) => guard.insert(action_type, executor),
            Err(poisoned) => poisoned.into_inner().insert(action_type, executor),
        }
    }

    pub fn register_fn<F, Fut>(&self, action_type: ActionType, func: F)
    where
        F: Fn(PendingAction) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, AppError>> + Send + 'static,
    {
        self.register(action_type, Arc::new(FnExecutor::new(func)));
    }

    pub fn unregister(&self, action_type: &ActionType) -> Option<Arc<dyn ActionExecutor>> {
        match self.executors.write() {
            Ok(mut guard) => guard.remove(action_type),
            Err(poisoned) => poisoned.into_inner().remove(action_type),
        }
    }

    pub fn resolve(&self, action_type: &ActionType) -> Option<Arc<dyn ActionExecutor>> {
        match self.executors.read() {
            Ok(guard) => guard.get(action_type).cloned(),
            Err(poisoned) => poisoned.into_inner().get(action_type).cloned(),
        }
    }

    pub fn contains(&self, action_type: &ActionType) -> bool {
        self.resolve(action_type).is_some()
    }
}
