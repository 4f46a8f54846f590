//! Task message decoding.

use serde_json::Value;

use hermes_models::VideoTask;

use crate::error::{QueueError, QueueResult};

/// Decode a delivery body holding one task or an array of tasks.
///
/// An empty array decodes to no tasks.
pub fn decode_tasks(body: &[u8]) -> QueueResult<Vec<VideoTask>> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| QueueError::decode(e.to_string()))?;

    let tasks = match value {
        Value::Array(_) => serde_json::from_value::<Vec<VideoTask>>(value),
        Value::Object(_) => serde_json::from_value::<VideoTask>(value).map(|t| vec![t]),
        other => {
            return Err(QueueError::decode(format!(
                "expected task object or array, got {}",
                json_kind(&other)
            )))
        }
    };

    tasks.map_err(|e| QueueError::decode(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
