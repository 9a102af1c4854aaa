use crate::domain::value_objects::{ActionType, HttpMethod, OfflinePayload, PendingActionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A deferred mutation waiting for connectivity. Only declarative fields live
/// here; the code that performs the remote call is resolved by `action_type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    pub id: PendingActionId,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub payload: OfflinePayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
    pub max_retries: u32,
}

impl PendingAction {
    pub fn from_draft(draft: PendingActionDraft, default_max_retries: u32) -> Self {
        Self {
            id: PendingActionId::generate(),
            action_type: draft.action_type,
            payload: draft.payload,
            endpoint: draft.endpoint,
            method: draft.method,
            created_at: Utc::now(),
            retry_count: 0,
            max_retries: draft.max_retries.unwrap_or(default_max_retries),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }

    pub fn retries_left(&self) -> u32 {
        self.max_retries.saturating_sub(self.retry_count)
    }

    /// Short human label for notifications.
    pub fn describe(&self) -> String {
        match (&self.method, &self.endpoint) {
            (Some(method), Some(endpoint)) => {
                format!("{} ({} {})", self.action_type, method, endpoint)
            }
            (None, Some(endpoint)) => format!("{} ({})", self.action_type, endpoint),
            _ => self.action_type.to_string(),
        }
    }
}

/// Enqueue input. The store assigns id, timestamp and counters.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingActionDraft {
    pub action_type: ActionType,
    pub payload: OfflinePayload,
    pub endpoint: Option<String>,
    pub method: Option<HttpMethod>,
    pub max_retries: Option<u32>,
}

impl PendingActionDraft {
    pub fn new(action_type: ActionType, payload: OfflinePayload) -> Self {
        Self {
            action_type,
            payload,
            endpoint: None,
            method: None,
            max_retries: None,
        }
    }

    pub fn with_endpoint(mut self, method: HttpMethod, endpoint: impl Into<String>) -> Self {
        self.method = Some(method);
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}
