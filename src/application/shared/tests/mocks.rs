use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::application::ports::{
    ActionExecutor, ConnectivityProbe, KeyValueStore, Notifier, ProbeResponse,
};
use crate::domain::entities::{Notification, PendingAction, PendingActionDraft, Severity};
use crate::domain::value_objects::{ActionType, HttpMethod, OfflinePayload};
use crate::shared::error::AppError;

pub fn sample_draft(action_type: &str, index: u64) -> PendingActionDraft {
    PendingActionDraft::new(
        ActionType::new(action_type).unwrap(),
        OfflinePayload::new(json!({ "idx": index })).unwrap(),
    )
    .with_endpoint(HttpMethod::Post, "projects")
}

/// Collects every notification it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().unwrap().clone()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|n| n.severity == severity)
            .collect()
    }

    pub fn titled(&self, title: &str) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|n| n.title == title)
            .collect()
    }

    pub fn clear(&self) {
        self.received.lock().unwrap().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), AppError> {
        self.received.lock().unwrap().push(notification);
        Ok(())
    }
}

pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _notification: Notification) -> Result<(), AppError> {
        Err(AppError::Internal("notifier unavailable".into()))
    }
}

pub struct PanickingNotifier;

impl Notifier for PanickingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), AppError> {
        panic!("notifier crashed on {}", notification.title)
    }
}

pub struct FailingKeyValueStore;

#[async_trait]
impl KeyValueStore for FailingKeyValueStore {
    async fn read(&self, _key: &str) -> Result<Option<String>, AppError> {
        Err(AppError::Storage("disk unavailable".into()))
    }

    async fn write(&self, _key: &str, _value: &str) -> Result<(), AppError> {
        Err(AppError::Storage("disk unavailable".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), AppError> {
        Err(AppError::Storage("disk unavailable".into()))
    }
}

#[derive(Clone, Copy)]
pub enum ExecBehavior {
    Succeed,
    Fail,
    Panic,
    Hang,
    /// Completes after the given delay.
    Delay(Duration),
}

/// Executor that records the payload index of each call and behaves per index.
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<u64>>,
    behaviors: Mutex<HashMap<u64, ExecBehavior>>,
}

impl RecordingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_behavior(&self, idx: u64, behavior: ExecBehavior) {
        self.behaviors.lock().unwrap().insert(idx, behavior);
    }

    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, idx: u64) -> usize {
        self.calls().into_iter().filter(|c| *c == idx).count()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(&self, action: &PendingAction) -> Result<Value, AppError> {
        let idx = action
            .payload
            .get("idx")
            .and_then(|idx| idx.as_u64())
            .unwrap_or(0);
        self.calls.lock().unwrap().push(idx);
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(&idx)
            .copied()
            .unwrap_or(ExecBehavior::Succeed);

        match behavior {
            ExecBehavior::Succeed => Ok(json!({ "ok": idx })),
            ExecBehavior::Fail => Err(AppError::Network(format!("action {idx} rejected"))),
            ExecBehavior::Panic => panic!("executor bug for action {idx}"),
            ExecBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            ExecBehavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(json!({ "ok": idx }))
            }
        }
    }
}

#[derive(Clone, Copy)]
pub enum ProbeBehavior {
    /// Answers with the given status after `latency`.
    Respond { latency: Duration, success: bool },
    Error,
    Hang,
}

pub struct FakeProbe {
    behavior: Mutex<ProbeBehavior>,
    calls: Mutex<usize>,
}

impl FakeProbe {
    pub fn new(behavior: ProbeBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            calls: Mutex::new(0),
        })
    }

    pub fn responding_after(millis: u64) -> Arc<Self> {
        Self::new(ProbeBehavior::Respond {
            latency: Duration::from_millis(millis),
            success: true,
        })
    }

    pub fn set_behavior(&self, behavior: ProbeBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ConnectivityProbe for FakeProbe {
    async fn probe(&self) -> Result<ProbeResponse, AppError> {
        *self.calls.lock().unwrap() += 1;
        let behavior = *self.behavior.lock().unwrap();
        match behavior {
            ProbeBehavior::Respond { latency, success } => {
                tokio::time::sleep(latency).await;
                Ok(ProbeResponse { success })
            }
            ProbeBehavior::Error => Err(AppError::Network("connection refused".into())),
            ProbeBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}
