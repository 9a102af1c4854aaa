use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body handed to the action executor. Any JSON value except `null`; the same
/// rule applies when a queue is reloaded from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct OfflinePayload(Value);

impl OfflinePayload {
    pub fn new(value: Value) -> Result<Self, String> {
        if value.is_null() {
            return Err("Action payload cannot be null".to_string());
        }
        Ok(Self(value))
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        serde_json::from_str::<Value>(json)
            .map_err(|e| format!("Action payload is not valid JSON: {e}"))
            .and_then(Self::new)
    }

    /// Top-level field of an object payload.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    /// Serialized size, used for logging.
    pub fn byte_len(&self) -> usize {
        serde_json::to_vec(&self.0).map(|bytes| bytes.len()).unwrap_or(0)
    }
}

impl TryFrom<Value> for OfflinePayload {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OfflinePayload> for Value {
    fn from(payload: OfflinePayload) -> Self {
        payload.0
    }
}
