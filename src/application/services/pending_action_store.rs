use crate::application::ports::key_value_store::KeyValueStore;
use crate::application::ports::notifier::{notify_best_effort, Notifier};
use crate::domain::entities::{Notification, PendingAction, PendingActionDraft};
use crate::domain::value_objects::PendingActionId;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Ordered queue of deferred actions mirrored to a durable key-value slot.
///
/// Every mutation rewrites the full list while the queue lock is held, so the
/// mirror receives snapshots in the same order the mutations happened. A failed
/// write is logged and the in-memory change stands.
pub struct PendingActionStore {
    actions: Mutex<Vec<PendingAction>>,
    storage: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    storage_key: String,
    default_max_retries: u32,
}

impl PendingActionStore {
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        storage_key: impl Into<String>,
        default_max_retries: u32,
    ) -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
            storage,
            notifier,
            storage_key: storage_key.into(),
            default_max_retries,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Seeds the queue from the durable mirror. Anything that is not a JSON
    /// array of actions counts as an empty queue.
    pub async fn load_persisted(&self) -> usize {
        let raw = match self.storage.read(&self.storage_key).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(
                    target: "offline::store",
                    key = %self.storage_key,
                    error = %err,
                    "failed to read persisted pending actions"
                );
                None
            }
        };

        let restored = raw
            .as_deref()
            .map(|raw| parse_persisted(&self.storage_key, raw))
            .unwrap_or_default();
        let count = restored.len();

        *self.actions.lock().await = restored;

        if count > 0 {
            tracing::info!(
                target: "offline::store",
                key = %self.storage_key,
                count,
                "restored pending actions"
            );
            notify_best_effort(
                self.notifier.as_ref(),
                Notification::warning(
                    "Pending actions restored",
                    format!("{count} action(s) from a previous session are waiting to sync"),
                ),
            );
        }

        count
    }

    pub async fn enqueue(&self, draft: PendingActionDraft) -> PendingActionId {
        let action = PendingAction::from_draft(draft, self.default_max_retries);
        let id = action.id.clone();

        let mut actions = self.actions.lock().await;
        tracing::debug!(
            target: "offline::store",
            action_id = %id,
            action_type = %action.action_type,
            payload_bytes = action.payload.byte_len(),
            "enqueued pending action"
        );
        actions.push(action);
        self.persist(&actions).await;

        id
    }

    /// Removes the action if it is still queued. Absent ids are a no-op.
    pub async fn dequeue(&self, id: &PendingActionId) -> bool {
        let mut actions = self.actions.lock().await;
        let Some(index) = actions.iter().position(|action| &action.id == id) else {
            return false;
        };
        actions.remove(index);
        self.persist(&actions).await;
        true
    }

    /// Bumps the retry counter of a queued action and returns its updated copy.
    pub async fn record_failure(&self, id: &PendingActionId) -> Option<PendingAction> {
        let mut actions = self.actions.lock().await;
        let action = actions.iter_mut().find(|action| &action.id == id)?;
        action.retry_count = action.retry_count.saturating_add(1);
        let updated = action.clone();
        self.persist(&actions).await;
        Some(updated)
    }

    pub async fn list(&self) -> Vec<PendingAction> {
        self.actions.lock().await.clone()
    }

    pub async fn get(&self, id: &PendingActionId) -> Option<PendingAction> {
        self.actions
            .lock()
            .await
            .iter()
            .find(|action| &action.id == id)
            .cloned()
    }

    pub async fn contains(&self, id: &PendingActionId) -> bool {
        self.actions.lock().await.iter().any(|action| &action.id == id)
    }

    pub async fn len(&self) -> usize {
        self.actions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.actions.lock().await.is_empty()
    }

    async fn persist(&self, actions: &[PendingAction]) {
        let serialized = match serde_json::to_string(actions) {
            Ok(serialized) => serialized,
            Err(err) => {
                tracing::error!(
                    target: "offline::store",
                    error = %err,
                    "failed to serialize pending actions"
                );
                return;
            }
        };

        if let Err(err) = self.storage.write(&self.storage_key, &serialized).await {
            tracing::warn!(
                target: "offline::store",
                key = %self.storage_key,
                pending = actions.len(),
                error = %err,
                "failed to persist pending actions; keeping in-memory queue"
            );
        }
    }
}

fn parse_persisted(key: &str, raw: &str) -> Vec<PendingAction> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(
                target: "offline::store",
                key,
                error = %err,
                "persisted pending actions are not valid JSON; starting empty"
            );
            return Vec::new();
        }
    };

    if !value.is_array() {
        tracing::warn!(
            target: "offline::store",
            key,
            "persisted pending actions are not an array; starting empty"
        );
        return Vec::new();
    }

    match serde_json::from_value::<Vec<PendingAction>>(value) {
        Ok(actions) => actions,
        Err(err) => {
            tracing::warn!(
                target: "offline::store",
                key,
                error = %err,
                "persisted pending actions have an unexpected shape; starting empty"
            );
            Vec::new()
        }
    }
}
